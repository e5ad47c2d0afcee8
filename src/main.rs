#[tokio::main]
async fn main() -> anyhow::Result<()> {
    eduadmin::bootstrapper::run().await
}
