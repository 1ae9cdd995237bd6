fn main() {
    if let Err(e) = subscription_tracker_lib::run() {
        let severity = e.severity();
        log::log!(
            severity.log_level(),
            "アプリケーションの実行に失敗しました [{severity:?}]: {}",
            e.details()
        );
        eprintln!("{}", e.user_message());
        std::process::exit(1);
    }
}
