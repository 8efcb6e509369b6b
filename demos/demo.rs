//! Validate an address, send a test letter and save its proof.
//!
//! ```sh
//! STANNP_API_KEY=... RUST_LOG=stannp_client=debug cargo run --example demo
//! ```

use stannp_client::{
    AddressValidationRequest, Client, LetterRequest, RecipientDetails, StannpApi,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let api_key = std::env::var("STANNP_API_KEY")?;
    let client = Client::builder()
        .api_key(api_key)
        .test_mode(true)
        .idempotency_key_generator(|| format!("demo-{}", std::process::id()))
        .build()?;

    run(&client).await?;
    Ok(())
}

async fn run(api: &dyn StannpApi) -> Result<(), stannp_client::ApiError> {
    let validation = api
        .validate_address(&AddressValidationRequest {
            address1: "9355 Burton Way".into(),
            city: "Beverly Hills".into(),
            company: "Beverly Hills Courthouse".into(),
            country: "US".into(),
            zipcode: "90210".into(),
            ..Default::default()
        })
        .await?;
    println!("Address valid: {}", validation.data.is_valid);

    let letter = api
        .send_letter(&LetterRequest {
            template: "307051".into(),
            recipient: RecipientDetails {
                title: "Mrs.".into(),
                firstname: "Judge".into(),
                lastname: "Judy".into(),
                address1: "9355 Burton Way".into(),
                address2: "Courthouse".into(),
                town: "Beverly Hills".into(),
                state: "CA".into(),
                zipcode: "90210".into(),
                country: "United States".into(),
            },
            ..Default::default()
        })
        .await?;
    println!(
        "Letter {} ({}), cost {}",
        letter.data.id, letter.data.status, letter.data.cost
    );

    let mut pdf = api.get_pdf_contents(&letter.data.pdf_url).await?;
    let saved = api.save_pdf_contents(&mut pdf.stream).await?;
    drop(pdf);
    println!("Proof saved to {} ({} bytes)", saved.path.display(), saved.size);

    Ok(())
}
