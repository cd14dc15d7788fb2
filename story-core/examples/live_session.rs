//! Quick end-to-end run of a story session against the live API

use story_core::{SeedWords, StoryConfig, StorySession};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    println!("=== Story Core Live Run ===\n");

    println!("1. Creating session from the environment...");
    let config = StoryConfig::from_env()?;
    let mut session = StorySession::from_config(&config)?;
    println!("   Model: {}", config.model);
    println!("   Steps: {}", session.steps().len());

    println!("\n2. Making the character (this calls the API)...");
    session
        .submit_words(SeedWords::new("토끼", "별", "바다"))
        .await?;
    println!("   ---");
    for line in session.character().lines() {
        println!("   {line}");
    }
    println!("   ---");

    println!("\n3. Filling every step...");
    let slots: Vec<(usize, bool)> = session
        .steps()
        .iter()
        .enumerate()
        .map(|(i, s)| (i, s.is_generated()))
        .collect();
    for (index, generated) in slots {
        if generated {
            session.generate_step(index).await?;
        } else {
            let title = session.step(index).map(|s| s.title.clone()).unwrap_or_default();
            session.write_step(index, format!("{title} 토끼는 별을 보며 웃었어요."))?;
        }
        let text = session.step(index).map(|s| s.text.as_str()).unwrap_or("");
        let snippet: String = text.chars().take(80).collect();
        println!("   {}. {snippet}", index + 1);
    }

    println!("\n4. Polishing...");
    let polished = session.polish().await?.to_string();
    println!("   Polished length: {} chars", polished.chars().count());

    println!("\n=== Done ===");
    Ok(())
}
