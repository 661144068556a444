use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    cropcast_server::main_entry().await
}
