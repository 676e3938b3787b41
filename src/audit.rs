//! Lighthouse 审计模块：
//! - 定位并调用外部 lighthouse CLI，输出 report.html / report.json
//! - 将 JSON 报告整理为 Markdown 检查清单（纯函数，不做 I/O）

use std::{
    fs,
    path::{Path, PathBuf},
    process::Command,
};

use serde_json::Value;
use thiserror::Error;
use which::which;

/// lighthouse 输出基名；多格式输出时实际文件为 `report.report.<ext>`
const REPORT_BASE: &str = "report";

/// 分类及通过阈值（Lighthouse 绿色区间）
const CATEGORIES: &[(&str, &str)] = &[
    ("performance", "Performance"),
    ("accessibility", "Accessibility"),
    ("best-practices", "Best Practices"),
    ("seo", "SEO"),
    ("pwa", "PWA"),
];
const PASS_THRESHOLD: f64 = 0.9;

/// 与安装能力相关的单项检查
const PWA_AUDITS: &[(&str, &str)] = &[
    ("installable-manifest", "Web app manifest meets installability requirements"),
    ("service-worker", "Registers a service worker that controls page and start_url"),
    ("is-on-https", "Uses HTTPS"),
    ("viewport", "Has a viewport meta tag"),
    ("themed-omnibox", "Sets a theme color for the address bar"),
    ("splash-screen", "Configured for a custom splash screen"),
    ("maskable-icon", "Manifest has a maskable icon"),
];

#[derive(Debug, Error)]
pub(crate) enum AuditError {
    #[error("未找到 lighthouse，可通过 `npm i -g lighthouse` 安装")]
    NotFound,

    #[error("指定的 lighthouse 不存在: {}", .0.display())]
    ExplicitNotFound(PathBuf),

    #[error("执行 lighthouse 失败: {0}")]
    CommandFailed(String),

    #[error("lighthouse 审计失败: {0}")]
    Failed(String),

    #[error("未找到 lighthouse 输出文件: {}", .0.display())]
    MissingOutput(PathBuf),

    #[error("报告文件读写失败")]
    Io(#[from] std::io::Error),

    #[error("解析 report.json 失败")]
    Json(#[from] serde_json::Error),
}

/// 调用 lighthouse CLI
pub(crate) struct LighthouseRunner {
    program: PathBuf,
}

impl LighthouseRunner {
    /// 优先使用显式路径，否则在 PATH 中查找 `lighthouse`
    pub(crate) fn new(explicit: Option<&Path>) -> Result<Self, AuditError> {
        let program = match explicit {
            Some(p) if p.exists() => p.to_path_buf(),
            Some(p) => return Err(AuditError::ExplicitNotFound(p.to_path_buf())),
            None => which("lighthouse").map_err(|_| AuditError::NotFound)?,
        };
        log::debug!("lighthouse: {}", program.display());
        Ok(Self { program })
    }

    /// 审计 `url`，在 `out_dir` 写出 report.html / report.json 并返回解析后的报告
    pub(crate) fn run(&self, url: &str, out_dir: &Path) -> Result<Value, AuditError> {
        fs::create_dir_all(out_dir)?;
        let output_base = out_dir.join(REPORT_BASE);
        let output_path = output_base
            .to_str()
            .ok_or_else(|| AuditError::CommandFailed("输出路径不是有效的 UTF-8".to_string()))?;

        log::info!("运行 lighthouse: {}", url);
        let output = Command::new(&self.program)
            .arg(url)
            .args([
                "--quiet",
                "--output=json",
                "--output=html",
                "--chrome-flags=--headless",
            ])
            .arg(format!("--output-path={}", output_path))
            .output()
            .map_err(|e| AuditError::CommandFailed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let message = if !stderr.trim().is_empty() { stderr } else { stdout };
            return Err(AuditError::Failed(message.trim().to_string()));
        }

        let json_path = collect_output(out_dir, "json")?;
        collect_output(out_dir, "html")?;
        let text = fs::read_to_string(&json_path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// 将 `report.report.<ext>` 移动为 `report.<ext>`，返回最终路径
fn collect_output(out_dir: &Path, ext: &str) -> Result<PathBuf, AuditError> {
    let target = out_dir.join(format!("{}.{}", REPORT_BASE, ext));
    let produced = out_dir.join(format!("{}.report.{}", REPORT_BASE, ext));
    if produced.exists() {
        fs::rename(&produced, &target)?;
    }
    if target.exists() {
        Ok(target)
    } else {
        Err(AuditError::MissingOutput(target))
    }
}

fn score_of(v: &Value) -> Option<f64> {
    v.get("score").and_then(Value::as_f64)
}

fn mark(score: Option<f64>) -> &'static str {
    match score {
        Some(s) if s >= PASS_THRESHOLD => "✅",
        Some(_) => "❌",
        None => "⚪",
    }
}

/// 将报告中固定的分类与检查项整理为 Markdown 清单
pub(crate) fn format_checklist(report: &Value) -> String {
    let mut md = String::new();
    md.push_str("# PWA Checklist\n\n");
    if let Some(u) = report
        .get("finalDisplayedUrl")
        .or_else(|| report.get("finalUrl"))
        .or_else(|| report.get("requestedUrl"))
        .and_then(Value::as_str)
    {
        md.push_str(&format!("- URL: {}\n", u));
    }
    if let Some(t) = report.get("fetchTime").and_then(Value::as_str) {
        md.push_str(&format!("- Audited: {}\n", t));
    }
    if let Some(v) = report.get("lighthouseVersion").and_then(Value::as_str) {
        md.push_str(&format!("- Lighthouse: {}\n", v));
    }
    md.push('\n');

    md.push_str("## Categories\n\n");
    md.push_str("| | Category | Score |\n");
    md.push_str("|---|---|---|\n");
    for (id, title) in CATEGORIES {
        let score = report.pointer(&format!("/categories/{}", id)).and_then(score_of);
        let shown = match score {
            Some(s) => format!("{:.0}", s * 100.0),
            None => "N/A".to_string(),
        };
        md.push_str(&format!("| {} | {} | {} |\n", mark(score), title, shown));
    }
    md.push('\n');

    md.push_str("## Installability\n\n");
    for (id, title) in PWA_AUDITS {
        let audit = report.pointer(&format!("/audits/{}", id));
        let not_applicable = audit
            .and_then(|a| a.get("scoreDisplayMode"))
            .and_then(Value::as_str)
            .map(|m| m == "notApplicable" || m == "manual")
            .unwrap_or(false);
        let score = if not_applicable { None } else { audit.and_then(score_of) };
        md.push_str(&format!("- {} {}\n", mark(score), title));
    }
    md.push('\n');
    md.push_str("✅ pass · ❌ fail · ⚪ not audited\n");
    md
}
