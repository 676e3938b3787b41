//! 生成流程模块：
//! - 以有序步骤表描述整个生成过程，每步带 `fatal` 标记
//! - 致命步骤失败即中止并返回错误；可选步骤失败仅记录警告
//! - 写出 manifest、Service Worker / Workbox 配置、离线页、图标、HTML 片段、README 与 Lighthouse 清单

use std::{fs, path::Path};

use anyhow::{Context, Result};
use log::{debug, warn};

use crate::{
    audit::{format_checklist, LighthouseRunner},
    config::{GenerateOptions, OutputTree, TemplateContext, WORKBOX_BUILD_CMD},
    icons::generate_icons,
    render::{self, Renderer},
};

/// 生成流程中的一步
pub(crate) struct Step<'a> {
    pub(crate) label: &'static str,
    pub(crate) fatal: bool,
    pub(crate) action: Box<dyn FnOnce() -> Result<()> + 'a>,
}

impl<'a> Step<'a> {
    fn required(label: &'static str, action: impl FnOnce() -> Result<()> + 'a) -> Self {
        Self { label, fatal: true, action: Box::new(action) }
    }

    fn optional(label: &'static str, action: impl FnOnce() -> Result<()> + 'a) -> Self {
        Self { label, fatal: false, action: Box::new(action) }
    }
}

/// 依次执行步骤；返回被跳过（失败的可选步骤）的标签
pub(crate) fn run_steps(steps: Vec<Step<'_>>) -> Result<Vec<&'static str>> {
    let mut skipped = Vec::new();
    for step in steps {
        println!("{}", step.label);
        match (step.action)() {
            Ok(()) => {}
            Err(e) if step.fatal => {
                return Err(e.context(format!("步骤失败: {}", step.label)));
            }
            Err(e) => {
                warn!("{} 失败（可选功能，已跳过）: {:#}", step.label, e);
                skipped.push(step.label);
            }
        }
    }
    Ok(skipped)
}

/// 执行完整生成流程
pub(crate) fn generate(
    opts: &GenerateOptions,
    ctx: &TemplateContext,
    renderer: &Renderer,
) -> Result<Vec<&'static str>> {
    let tree = OutputTree::new(&opts.output);

    let mut steps = vec![
        Step::required("📁 创建目录", || tree.create(opts.report)),
        Step::required("📄 生成 manifest.json", || {
            write_rendered(renderer, render::MANIFEST, ctx, &tree.public.join("manifest.json"))
        }),
    ];
    if opts.workbox {
        steps.push(Step::required("⚙️ 生成 workbox-config.js", || {
            write_rendered(renderer, render::WORKBOX_CONFIG, ctx, &tree.root.join("workbox-config.js"))?;
            println!("   ℹ️ 需要执行 `{}` 生成 sw.js", WORKBOX_BUILD_CMD);
            Ok(())
        }));
    } else {
        steps.push(Step::required("⚙️ 生成 sw.js", || {
            write_rendered(renderer, render::SW_BASIC, ctx, &tree.public.join("sw.js"))
        }));
    }
    steps.push(Step::required("📱 生成离线页", || {
        write_rendered(renderer, render::OFFLINE_PAGE, ctx, &tree.public.join("offline.html"))
    }));
    steps.push(Step::required("🎨 生成图标", || {
        generate_icons(opts.icon.as_deref(), &tree.icons, &opts.name, &opts.theme_color)
            .context("生成图标失败")?;
        Ok(())
    }));
    steps.push(Step::required("📝 生成 HTML 片段", || {
        write_rendered(renderer, render::HEAD_SNIPPET, ctx, &tree.docs.join("head-snippet.html"))?;
        write_rendered(renderer, render::APPLE_META, ctx, &tree.docs.join("apple-meta.html"))
    }));
    steps.push(Step::required("📚 生成 README", || {
        write_rendered(renderer, render::README, ctx, &tree.root.join("README.md"))
    }));
    if opts.report {
        steps.push(Step::optional("🔍 生成 Lighthouse 报告", || {
            run_lighthouse(opts, &tree)
        }));
    }

    run_steps(steps)
}

fn write_rendered(renderer: &Renderer, name: &str, ctx: &TemplateContext, path: &Path) -> Result<()> {
    let text = renderer.render(name, ctx)?;
    fs::write(path, text).with_context(|| format!("写入失败: {}", path.display()))?;
    debug!("{} -> {}", name, path.display());
    println!("   ✓ {}", path.display());
    Ok(())
}

fn run_lighthouse(opts: &GenerateOptions, tree: &OutputTree) -> Result<()> {
    let runner = LighthouseRunner::new(opts.lighthouse.as_deref())?;
    let report = runner.run(&opts.url, &tree.lighthouse)?;
    let checklist_path = tree.lighthouse.join("checklist.md");
    fs::write(&checklist_path, format_checklist(&report))
        .with_context(|| format!("写入失败: {}", checklist_path.display()))?;
    println!("   ✓ {}", checklist_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RawOptions;
    use std::cell::RefCell;

    #[test]
    fn steps_run_in_order() {
        let calls = RefCell::new(Vec::new());
        let steps = vec![
            Step::required("a", || {
                calls.borrow_mut().push("a");
                Ok(())
            }),
            Step::required("b", || {
                calls.borrow_mut().push("b");
                Ok(())
            }),
        ];
        let skipped = run_steps(steps).unwrap();
        assert!(skipped.is_empty());
        assert_eq!(*calls.borrow(), vec!["a", "b"]);
    }

    #[test]
    fn fatal_failure_stops_the_run() {
        let calls = RefCell::new(Vec::new());
        let steps = vec![
            Step::required("boom", || anyhow::bail!("disk full")),
            Step::required("after", || {
                calls.borrow_mut().push("after");
                Ok(())
            }),
        ];
        let err = run_steps(steps).unwrap_err();
        assert!(format!("{:#}", err).contains("disk full"));
        assert!(format!("{:#}", err).contains("boom"));
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn optional_failure_is_skipped() {
        let calls = RefCell::new(Vec::new());
        let steps = vec![
            Step::optional("audit", || anyhow::bail!("no chrome")),
            Step::required("after", || {
                calls.borrow_mut().push("after");
                Ok(())
            }),
        ];
        let skipped = run_steps(steps).unwrap();
        assert_eq!(skipped, vec!["audit"]);
        assert_eq!(*calls.borrow(), vec!["after"]);
    }

    fn options(out: &Path, workbox: bool, report: bool) -> GenerateOptions {
        GenerateOptions::resolve(RawOptions {
            url: "https://example.com".into(),
            name: Some("Zebra".into()),
            workbox,
            report,
            output: Some(out.to_path_buf()),
            lighthouse: Some(out.join("no-such-lighthouse")),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn generates_full_tree() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("out");
        let opts = options(&out, false, false);
        let ctx = TemplateContext::new(&opts, "2026-01-01T00:00:00Z".into());
        let renderer = Renderer::new(None).unwrap();
        let skipped = generate(&opts, &ctx, &renderer).unwrap();
        assert!(skipped.is_empty());
        for rel in [
            "public/manifest.json",
            "public/sw.js",
            "public/offline.html",
            "public/icons/icon-192.png",
            "public/icons/icon-512.png",
            "docs/head-snippet.html",
            "docs/apple-meta.html",
            "README.md",
        ] {
            assert!(out.join(rel).is_file(), "missing {}", rel);
        }
        assert!(!out.join("workbox-config.js").exists());
        assert!(!out.join("lighthouse").exists());
    }

    #[test]
    fn workbox_mode_replaces_service_worker() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("out");
        let opts = options(&out, true, false);
        let ctx = TemplateContext::new(&opts, "2026-01-01T00:00:00Z".into());
        let renderer = Renderer::new(None).unwrap();
        generate(&opts, &ctx, &renderer).unwrap();
        assert!(out.join("workbox-config.js").is_file());
        assert!(!out.join("public/sw.js").exists());
    }

    #[test]
    fn failed_audit_keeps_other_outputs() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("out");
        let opts = options(&out, false, true);
        let ctx = TemplateContext::new(&opts, "2026-01-01T00:00:00Z".into());
        let renderer = Renderer::new(None).unwrap();
        let skipped = generate(&opts, &ctx, &renderer).unwrap();
        assert_eq!(skipped.len(), 1);
        assert!(out.join("README.md").is_file());
        assert!(out.join("lighthouse").is_dir());
        assert!(!out.join("lighthouse/checklist.md").exists());
    }

    #[test]
    fn missing_template_aborts() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("out");
        let opts = options(&out, false, false);
        let ctx = TemplateContext::new(&opts, "2026-01-01T00:00:00Z".into());
        let renderer = Renderer::from_templates(Vec::new()).unwrap();
        let err = generate(&opts, &ctx, &renderer).unwrap_err();
        assert!(format!("{:#}", err).contains("manifest.json.tera"));
        assert!(out.join("public").is_dir());
        assert!(!out.join("README.md").exists());
    }
}
