use strata_logger::{LevelFilter, Logger};

#[test]
fn console_only_logger_has_no_file_layer() {
    let logger = Logger::builder()
        .name("strata-console")
        .level(LevelFilter::DEBUG)
        .thread_names(true)
        .init()
        .expect("logger should initialize");

    assert!(!logger.has_file());
    tracing::debug!(unit = 0, "console only");
}
