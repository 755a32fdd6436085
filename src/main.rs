#[tokio::main]
async fn main() -> anyhow::Result<()> {
    channel_surf_lib::run().await
}
