use indicatif::ProgressBar;
use std::io::{self, Write};
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 表示中のプログレスバー（ログ出力時に一時的に消す）
static ACTIVE_BAR: Mutex<Option<ProgressBar>> = Mutex::new(None);

/// プログレスバー表示中のログ出力をバーと混ざらないようにする
pub fn attach_progress_bar(pb: &ProgressBar) {
    if let Ok(mut slot) = ACTIVE_BAR.lock() {
        *slot = Some(pb.clone());
    }
}

pub fn detach_progress_bar() {
    if let Ok(mut slot) = ACTIVE_BAR.lock() {
        *slot = None;
    }
}

fn active_bar() -> Option<ProgressBar> {
    ACTIVE_BAR.lock().ok().and_then(|slot| slot.clone())
}

/// stderrへのログ書き込み。バー表示中は `suspend` して書く
struct BarAwareStderr;

impl Write for BarAwareStderr {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match active_bar() {
            Some(pb) => pb.suspend(|| io::stderr().write_all(buf))?,
            None => io::stderr().write_all(buf)?,
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

/// CLI用ロガー（stderr出力、RUST_LOGで上書き可）
pub fn init_cli_logger(verbose: bool) {
    let default_filter = if verbose {
        "return_grader=debug,return_grader_common=debug,info"
    } else {
        "return_grader=info,return_grader_common=warn"
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(|| BarAwareStderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}
