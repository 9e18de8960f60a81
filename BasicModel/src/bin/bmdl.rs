fn main() -> anyhow::Result<()> {
    basicmodel::cli::run_cli()
}
