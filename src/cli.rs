//! CLI 定义模块：仅负责命令行参数结构体与解析
//! 将 clap 的声明与业务逻辑解耦；默认值与环境变量在 commands 中合并。

use clap::Parser;
use std::path::PathBuf;

/// 顶层 CLI 入口
#[derive(Parser, Debug)]
#[command(
    name = "pwa-upgrader",
    about = "生成将网站升级为 PWA 所需的文件与接入指南",
    version
)]
pub(crate) struct Cli {
    /// 目标站点 URL（必填，http/https）
    #[arg(long, value_name = "URL")]
    pub(crate) url: String,
    /// 应用名称，默认：My PWA
    #[arg(long, value_name = "NAME")]
    pub(crate) name: Option<String>,
    /// 主屏幕短名称，默认取应用名称前 12 个字符
    #[arg(long, value_name = "SHORT")]
    pub(crate) short: Option<String>,
    /// 主题色（#RRGGBB），默认：#0ea5e9
    #[arg(long, value_name = "HEX")]
    pub(crate) theme: Option<String>,
    /// PWA 作用域，默认：/
    #[arg(long, value_name = "PATH")]
    pub(crate) scope: Option<String>,
    /// 启动 URL，默认：/
    #[arg(long, value_name = "PATH")]
    pub(crate) start: Option<String>,
    /// 生成 Workbox 配置（高级缓存）代替基础 sw.js
    #[arg(long)]
    pub(crate) workbox: bool,
    /// 运行 Lighthouse 并生成检查清单（可选，失败不影响其它输出）
    #[arg(long)]
    pub(crate) report: bool,
    /// 源图标路径（建议 512x512，支持 PNG/JPEG/WebP/SVG 等）
    #[arg(long, value_name = "PATH")]
    pub(crate) icon: Option<PathBuf>,
    /// 输出目录，默认：pwa-output
    #[arg(long, value_name = "DIR")]
    pub(crate) output: Option<PathBuf>,
    /// 自定义模板目录，其中的同名 *.tera 覆盖内置模板
    #[arg(long, value_name = "DIR")]
    pub(crate) templates: Option<PathBuf>,
    /// lighthouse 可执行文件路径（默认在 PATH 中查找）
    #[arg(long, value_name = "PATH")]
    pub(crate) lighthouse: Option<PathBuf>,
    /// 输出调试日志
    #[arg(short, long)]
    pub(crate) verbose: bool,
}
