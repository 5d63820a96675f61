fn main() -> anyhow::Result<()> {
    prospect_app::run()
}
