mod runtime;

fn main() -> anyhow::Result<()> {
    runtime::run_app()
}
