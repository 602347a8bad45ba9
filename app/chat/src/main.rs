#[tokio::main]
async fn main() {
    retail_advisor_chat_lib::run().await
}
