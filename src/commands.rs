//! 命令调度模块：
//! - 接收解析好的 CLI 参数，与环境变量合并为“有效参数”并校验
//! - 构建模板上下文，调用生成流程，打印结果摘要

use anyhow::{Context, Result};

use crate::{
    build::generate,
    cli::Cli,
    config::{
        generated_now, GenerateOptions, RawOptions, TemplateContext, ICON_SPECS,
        WORKBOX_BUILD_CMD,
    },
    render::Renderer,
    utils::{env_bool_truthy, env_opt_path, env_opt_string},
};

/// 执行一次生成
pub(crate) fn run(cli: Cli) -> Result<()> {
    // 环境变量覆盖（若 CLI 未指定）
    let raw = RawOptions {
        url: cli.url,
        name: cli.name.or_else(|| env_opt_string("PWA_UPGRADER_NAME")),
        short: cli.short.or_else(|| env_opt_string("PWA_UPGRADER_SHORT")),
        theme: cli.theme.or_else(|| env_opt_string("PWA_UPGRADER_THEME")),
        scope: cli.scope.or_else(|| env_opt_string("PWA_UPGRADER_SCOPE")),
        start: cli.start.or_else(|| env_opt_string("PWA_UPGRADER_START")),
        workbox: cli.workbox || env_bool_truthy("PWA_UPGRADER_WORKBOX").unwrap_or(false),
        report: cli.report || env_bool_truthy("PWA_UPGRADER_REPORT").unwrap_or(false),
        icon: cli.icon.or_else(|| env_opt_path("PWA_UPGRADER_ICON")),
        output: cli.output.or_else(|| env_opt_path("PWA_UPGRADER_OUTPUT")),
        templates: cli.templates.or_else(|| env_opt_path("PWA_UPGRADER_TEMPLATES")),
        lighthouse: cli.lighthouse.or_else(|| env_opt_path("PWA_UPGRADER_LIGHTHOUSE")),
    };

    // 校验在任何写入之前完成
    let opts = GenerateOptions::resolve(raw)?;
    let renderer = Renderer::new(opts.templates.as_deref()).context("加载模板失败")?;
    let ctx = TemplateContext::new(&opts, generated_now());

    println!("🚀 PWA Upgrader");
    println!("   目标 URL: {}", opts.url);
    println!("   应用名称: {}", opts.name);
    println!("   输出目录: {}", opts.output.display());
    println!();

    let skipped = generate(&opts, &ctx, &renderer)?;

    print_summary(&opts, !skipped.is_empty());
    Ok(())
}

fn print_summary(opts: &GenerateOptions, audit_skipped: bool) {
    let out = opts.output.display();
    println!();
    println!("✅ PWA 文件生成完成 -> {}", out);
    println!("📦 生成的文件:");
    println!("   {}/", out);
    println!("   ├─ public/");
    println!("   │  ├─ manifest.json");
    if opts.workbox {
        println!("   │  ├─ (sw.js：需执行 `{}` 生成)", WORKBOX_BUILD_CMD);
    } else {
        println!("   │  ├─ sw.js");
    }
    println!("   │  ├─ offline.html");
    println!("   │  └─ icons/");
    for (i, spec) in ICON_SPECS.iter().enumerate() {
        let branch = if i + 1 == ICON_SPECS.len() { "└─" } else { "├─" };
        println!("   │     {} {}", branch, spec.file_name);
    }
    println!("   ├─ docs/");
    println!("   │  ├─ head-snippet.html");
    println!("   │  └─ apple-meta.html");
    if opts.workbox {
        println!("   ├─ workbox-config.js");
    }
    if opts.report {
        if audit_skipped {
            println!("   ├─ lighthouse/ (审计失败，已跳过)");
        } else {
            println!("   ├─ lighthouse/");
            println!("   │  ├─ report.html");
            println!("   │  ├─ report.json");
            println!("   │  └─ checklist.md");
        }
    }
    println!("   └─ README.md");
    println!();
    println!("📖 下一步:");
    println!("   1. 阅读 {}/README.md", out);
    println!("   2. 将 public/ 中的文件上传到网站根目录");
    println!("   3. 把 docs/head-snippet.html 的内容加入 <head>");
    println!("   4. 测试安装与离线行为");
}
