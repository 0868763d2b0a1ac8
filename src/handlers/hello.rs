pub async fn hello_handler() -> &'static str {
    "Hello World!"
}
