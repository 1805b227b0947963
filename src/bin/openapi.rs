use anyhow::Result;

// Print the OpenAPI document to stdout
fn main() -> Result<()> {
    let doc = latidoverde::api::openapi();
    let json = serde_json::to_string_pretty(&doc)?;
    println!("{json}");
    Ok(())
}
