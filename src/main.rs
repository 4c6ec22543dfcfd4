fn main() -> anyhow::Result<()> {
    hearth_tui::cli::run()
}
