use colored::*;
use console::measure_text_width;
use std::fmt;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::{
    fmt::{format::Writer, FmtContext, FormatEvent, FormatFields},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter,
};

const CRATE_TARGET: &str = "imagely_api";

const DEFAULT_FILTER: &str = "info,sqlx=warn,sqlx::query=off,sea_orm=warn,hyper=warn,tower=warn,tower_http=warn,axum=warn,h2=warn,mio=warn";

const MODULE_WIDTH: usize = 9;

/// 终端日志格式：`时间 级别 模块 │ 内容`
pub struct ConsoleFormatter;

impl<S, N> FormatEvent<S, N> for ConsoleFormatter
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();
        let time = chrono::Local::now().format("%H:%M:%S").to_string();

        write!(
            writer,
            "{} {} {} {} ",
            time.bright_black(),
            pad(level_label(meta.level()), 5),
            short_module(meta.target()).bright_blue(),
            "│".bright_black()
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// 按可见宽度补齐，忽略 ANSI 转义序列
fn pad(text: ColoredString, width: usize) -> String {
    let visible = measure_text_width(&text.to_string());
    format!("{}{}", text, " ".repeat(width.saturating_sub(visible)))
}

fn level_label(level: &Level) -> ColoredString {
    match *level {
        Level::ERROR => "ERROR".bright_red(),
        Level::WARN => "WARN".bright_yellow(),
        Level::INFO => "INFO".bright_green(),
        Level::DEBUG => "DEBUG".bright_blue(),
        Level::TRACE => "TRACE".bright_magenta(),
    }
}

/// 取 target 的最后一段作为模块名，固定宽度显示
fn short_module(target: &str) -> String {
    let module = match target.strip_prefix(CRATE_TARGET) {
        Some("") => "main",
        Some(rest) => rest.rsplit("::").next().unwrap_or("app"),
        None => target.rsplit("::").next().unwrap_or(target),
    };

    if module.chars().count() > MODULE_WIDTH {
        let head: String = module.chars().take(MODULE_WIDTH - 2).collect();
        format!("{head}..")
    } else {
        format!("{module:<MODULE_WIDTH$}")
    }
}

/// 一条 HTTP 访问日志
pub struct RequestLine<'a> {
    pub method: &'a str,
    pub uri: &'a str,
    pub status: u16,
    pub elapsed: Duration,
    pub client: Option<&'a str>,
}

impl fmt::Display for RequestLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = self.status.to_string();
        let status = match self.status {
            200..=299 => status.bright_green(),
            300..=399 => status.bright_yellow(),
            400..=499 => status.bright_red(),
            500..=599 => status.on_red().bright_white(),
            _ => status.normal(),
        };

        let ms = self.elapsed.as_secs_f64() * 1000.0;
        let elapsed = format!("{ms:>7.1}ms");
        // 创建相册要生成缩略图，通常落在慢请求区间
        let elapsed = match ms {
            ms if ms < 100.0 => elapsed.bright_green(),
            ms if ms < 500.0 => elapsed.bright_yellow(),
            _ => elapsed.bright_red(),
        };

        let method = format!("{:<6}", self.method);
        let method = match self.method {
            "GET" => method.bright_green(),
            "POST" => method.bright_blue(),
            "PUT" => method.bright_yellow(),
            "DELETE" => method.bright_red(),
            _ => method.normal(),
        };

        write!(f, "{status} {elapsed} {method} {}", self.uri.bright_white())?;
        if let Some(client) = self.client {
            write!(f, " {}", format!("from {client}").bright_black())?;
        }
        Ok(())
    }
}

pub fn init_logging() -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))?;
    let registry = tracing_subscriber::registry().with(filter);

    if atty::is(atty::Stream::Stdout) {
        registry
            .with(tracing_subscriber::fmt::layer().event_format(ConsoleFormatter))
            .init();
    } else {
        // 重定向到文件或日志收集器时使用默认格式
        registry
            .with(tracing_subscriber::fmt::layer().with_ansi(false))
            .init();
    }

    Ok(())
}

fn banner(title: &str, color: Color) {
    let rule = "─".repeat(60);
    println!("{}", rule.color(color));
    println!("  {}", title.color(color).bold());
    println!("{}", rule.color(color));
}

pub fn log_startup_info(config: &crate::config::Config) {
    println!();
    banner("📷 Imagely 相册服务启动中...", Color::BrightCyan);

    tracing::info!("数据库: {}", mask_database_url(&config.database.url));
    tracing::info!("监听: {}:{}", config.server.host, config.server.port);
    tracing::info!(
        "媒体根目录: {} (上传上限 {} 字节)",
        config.media.root.display(),
        config.media.max_upload_bytes
    );
}

pub fn log_server_ready(addr: &std::net::SocketAddr) {
    banner("✅ 服务器已就绪", Color::BrightGreen);
    println!("  🌐 {}", format!("http://{addr}").bright_white().underline());
    println!("  📚 {}", format!("http://{addr}/docs").bright_blue().underline());
    println!();

    tracing::info!("开始接受请求: {}", addr);
}

pub fn log_shutdown() {
    println!();
    banner("👋 服务器已停止", Color::BrightYellow);
}

/// 日志里不出现数据库密码
fn mask_database_url(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(mut parsed) if parsed.password().is_some() => {
            let _ = parsed.set_password(Some("****"));
            parsed.to_string()
        }
        Ok(parsed) => parsed.to_string(),
        Err(_) => "***已屏蔽***".to_string(),
    }
}
