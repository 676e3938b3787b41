//! 生成参数与模板上下文：
//! - `GenerateOptions`：校验后的有效参数（CLI > 环境变量 > 默认值）
//! - `TemplateContext`：一次运行内只构建一次、所有模板只读共享的渲染数据
//! - `OutputTree`：输出目录结构
//! - `ICON_SPECS`：固定的图标尺寸表

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use serde::Serialize;

use crate::utils::{cache_name, derive_short_name, is_hex_color, is_valid_target_url};

pub(crate) const DEFAULT_NAME: &str = "My PWA";
pub(crate) const DEFAULT_THEME: &str = "#0ea5e9";
pub(crate) const DEFAULT_SCOPE: &str = "/";
pub(crate) const DEFAULT_START: &str = "/";
pub(crate) const DEFAULT_OUTPUT: &str = "pwa-output";
pub(crate) const BACKGROUND_COLOR: &str = "#ffffff";
/// 由 workbox-config.js 生成 sw.js 的命令
pub(crate) const WORKBOX_BUILD_CMD: &str = "npx workbox-cli generateSW workbox-config.js";

/// 图标规格：像素尺寸与输出文件名
#[derive(Debug, Clone, Copy)]
pub(crate) struct IconSpec {
    pub(crate) size: u32,
    pub(crate) file_name: &'static str,
}

pub(crate) const ICON_SPECS: &[IconSpec] = &[
    IconSpec { size: 192, file_name: "icon-192.png" },
    IconSpec { size: 512, file_name: "icon-512.png" },
];

/// 未经校验的原始输入（已合并 CLI 与环境变量）
#[derive(Debug, Default, Clone)]
pub(crate) struct RawOptions {
    pub(crate) url: String,
    pub(crate) name: Option<String>,
    pub(crate) short: Option<String>,
    pub(crate) theme: Option<String>,
    pub(crate) scope: Option<String>,
    pub(crate) start: Option<String>,
    pub(crate) workbox: bool,
    pub(crate) report: bool,
    pub(crate) icon: Option<PathBuf>,
    pub(crate) output: Option<PathBuf>,
    pub(crate) templates: Option<PathBuf>,
    pub(crate) lighthouse: Option<PathBuf>,
}

/// 校验后的生成参数
#[derive(Debug, Clone)]
pub(crate) struct GenerateOptions {
    pub(crate) url: String,
    pub(crate) name: String,
    pub(crate) short_name: String,
    pub(crate) theme_color: String,
    pub(crate) scope: String,
    pub(crate) start_url: String,
    pub(crate) workbox: bool,
    pub(crate) report: bool,
    pub(crate) icon: Option<PathBuf>,
    pub(crate) output: PathBuf,
    pub(crate) templates: Option<PathBuf>,
    pub(crate) lighthouse: Option<PathBuf>,
}

impl GenerateOptions {
    /// 填充默认值并校验；任何失败都发生在写入文件之前。
    pub(crate) fn resolve(raw: RawOptions) -> Result<Self> {
        let url = raw.url.trim().to_string();
        if !is_valid_target_url(&url) {
            bail!(
                "无效的 URL: {:?}（必须以 http:// 或 https:// 开头，例如 https://example.com）",
                raw.url
            );
        }
        let theme_color = raw.theme.unwrap_or_else(|| DEFAULT_THEME.to_string());
        if !is_hex_color(&theme_color) {
            bail!(
                "无效的主题色: {:?}（需要 # 加 6 位十六进制，例如 {}）",
                theme_color,
                DEFAULT_THEME
            );
        }
        let name = raw.name.unwrap_or_else(|| DEFAULT_NAME.to_string());
        let short_name = raw.short.unwrap_or_else(|| derive_short_name(&name));
        Ok(Self {
            url,
            name,
            short_name,
            theme_color,
            scope: raw.scope.unwrap_or_else(|| DEFAULT_SCOPE.to_string()),
            start_url: raw.start.unwrap_or_else(|| DEFAULT_START.to_string()),
            workbox: raw.workbox,
            report: raw.report,
            icon: raw.icon,
            output: raw.output.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT)),
            templates: raw.templates,
            lighthouse: raw.lighthouse,
        })
    }
}

/// manifest / 片段中引用的图标
#[derive(Debug, Clone, Serialize)]
pub(crate) struct IconEntry {
    pub(crate) size: u32,
    pub(crate) file_name: String,
    pub(crate) src: String,
}

/// 模板上下文；构建后不再修改
#[derive(Debug, Clone, Serialize)]
pub(crate) struct TemplateContext {
    pub(crate) url: String,
    pub(crate) app_name: String,
    pub(crate) short_name: String,
    pub(crate) theme_color: String,
    pub(crate) background_color: String,
    pub(crate) scope: String,
    pub(crate) start_url: String,
    pub(crate) cache_name: String,
    pub(crate) generated_date: String,
    pub(crate) output_dir: String,
    pub(crate) public_dir: String,
    pub(crate) workbox: bool,
    pub(crate) has_report: bool,
    pub(crate) icons: Vec<IconEntry>,
    pub(crate) version: String,
    pub(crate) workbox_command: &'static str,
}

impl TemplateContext {
    pub(crate) fn new(opts: &GenerateOptions, generated_date: String) -> Self {
        let tree = OutputTree::new(&opts.output);
        let icons = ICON_SPECS
            .iter()
            .map(|spec| IconEntry {
                size: spec.size,
                file_name: spec.file_name.to_string(),
                src: format!("/icons/{}", spec.file_name),
            })
            .collect();
        Self {
            url: opts.url.clone(),
            app_name: opts.name.clone(),
            short_name: opts.short_name.clone(),
            theme_color: opts.theme_color.clone(),
            background_color: BACKGROUND_COLOR.to_string(),
            scope: opts.scope.clone(),
            start_url: opts.start_url.clone(),
            cache_name: cache_name(&opts.name),
            generated_date,
            output_dir: opts.output.display().to_string(),
            public_dir: tree.public.display().to_string(),
            workbox: opts.workbox,
            has_report: opts.report,
            icons,
            version: env!("CARGO_PKG_VERSION").to_string(),
            workbox_command: WORKBOX_BUILD_CMD,
        }
    }
}

/// 构建时间（UTC，ISO 8601 简化至秒）
pub(crate) fn generated_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

/// 输出目录结构
#[derive(Debug, Clone)]
pub(crate) struct OutputTree {
    pub(crate) root: PathBuf,
    pub(crate) public: PathBuf,
    pub(crate) icons: PathBuf,
    pub(crate) docs: PathBuf,
    pub(crate) lighthouse: PathBuf,
}

impl OutputTree {
    pub(crate) fn new(root: &Path) -> Self {
        let public = root.join("public");
        Self {
            root: root.to_path_buf(),
            icons: public.join("icons"),
            public,
            docs: root.join("docs"),
            lighthouse: root.join("lighthouse"),
        }
    }

    /// 创建目录（可重复调用）；`with_report` 时额外创建 lighthouse/
    pub(crate) fn create(&self, with_report: bool) -> Result<()> {
        if self.root.exists() {
            log::debug!("输出目录已存在，将覆盖同名文件: {}", self.root.display());
        }
        let mut dirs = vec![&self.public, &self.icons, &self.docs];
        if with_report {
            dirs.push(&self.lighthouse);
        }
        for dir in dirs {
            fs::create_dir_all(dir)
                .with_context(|| format!("创建目录失败: {}", dir.display()))?;
        }
        Ok(())
    }
}
