//! 模板渲染模块：
//! - 内置模板通过 include_dir 打包进二进制
//! - 可选覆盖目录：同名 `*.tera` 文件优先于内置模板
//! - 按模板名 + `TemplateContext` 渲染文本

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use include_dir::{include_dir, Dir};
use tera::{Context as TContext, Tera};
use thiserror::Error;

use crate::config::TemplateContext;

static BUNDLED_TEMPLATES: Dir = include_dir!("$CARGO_MANIFEST_DIR/templates");

pub(crate) const MANIFEST: &str = "manifest.json.tera";
pub(crate) const SW_BASIC: &str = "sw-basic.js.tera";
pub(crate) const WORKBOX_CONFIG: &str = "workbox-config.js.tera";
pub(crate) const OFFLINE_PAGE: &str = "offline.html.tera";
pub(crate) const HEAD_SNIPPET: &str = "head-snippet.html.tera";
pub(crate) const APPLE_META: &str = "apple-meta.html.tera";
pub(crate) const README: &str = "README.md.tera";

const TEMPLATE_EXT: &str = "tera";

#[derive(Debug, Error)]
pub(crate) enum TemplateError {
    #[error("模板不存在: {0}")]
    NotFound(String),

    #[error("模板解析失败")]
    Parse(#[source] tera::Error),

    #[error("渲染模板 {name} 失败")]
    Render {
        name: String,
        #[source]
        source: tera::Error,
    },

    #[error("读取模板目录失败: {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 已加载模板集合
pub(crate) struct Renderer {
    tera: Tera,
}

impl Renderer {
    /// 加载内置模板，并用 `override_dir` 中的同名模板覆盖
    pub(crate) fn new(override_dir: Option<&Path>) -> Result<Self, TemplateError> {
        let mut sources: BTreeMap<String, String> = BTreeMap::new();
        for f in BUNDLED_TEMPLATES.files() {
            if let Some(text) = f.contents_utf8() {
                sources.insert(f.path().to_string_lossy().into_owned(), text.to_string());
            }
        }
        if let Some(dir) = override_dir {
            for (name, text) in read_override_dir(dir)? {
                log::debug!("使用自定义模板: {}", name);
                sources.insert(name, text);
            }
        }
        Self::from_templates(sources)
    }

    /// 从 (模板名, 内容) 列表构建；模板语法错误在此处报告
    pub(crate) fn from_templates<I>(templates: I) -> Result<Self, TemplateError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![".html.tera", ".html"]);
        tera.add_raw_templates(templates).map_err(TemplateError::Parse)?;
        Ok(Self { tera })
    }

    pub(crate) fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }

    /// 渲染指定模板
    pub(crate) fn render(&self, name: &str, ctx: &TemplateContext) -> Result<String, TemplateError> {
        if !self.has_template(name) {
            return Err(TemplateError::NotFound(name.to_string()));
        }
        let tctx = TContext::from_serialize(ctx).map_err(|source| TemplateError::Render {
            name: name.to_string(),
            source,
        })?;
        self.tera.render(name, &tctx).map_err(|source| TemplateError::Render {
            name: name.to_string(),
            source,
        })
    }
}

fn read_override_dir(dir: &Path) -> Result<Vec<(String, String)>, TemplateError> {
    let io_err = |source| TemplateError::Io { path: dir.to_path_buf(), source };
    let mut out = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(TEMPLATE_EXT) {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            continue;
        };
        let text = fs::read_to_string(&path)
            .map_err(|source| TemplateError::Io { path: path.clone(), source })?;
        out.push((name, text));
    }
    Ok(out)
}
