fn main() -> anyhow::Result<()> {
    events_scrape_lib::run()
}
