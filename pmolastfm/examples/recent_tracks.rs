//! Exemple d'utilisation de pmolastfm
//!
//! Cet exemple montre comment :
//! - Créer un client depuis l'environnement (`PMOLASTFM__API_KEY`, ...)
//! - Afficher le titre en cours d'écoute et les derniers scrobbles
//! - Interroger le profil et les artistes favoris d'un utilisateur
//!
//! ```text
//! PMOLASTFM__API_KEY=xxxx cargo run -p pmolastfm --example recent_tracks -- RJ
//! ```

use pmolastfm::{LastFmClient, LastFmError, Period};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialiser le logging
    tracing_subscriber::fmt::init();

    let user = std::env::args().nth(1).unwrap_or_else(|| "RJ".to_string());

    println!("=== PMOLastFM - Titres récents de {} ===\n", user);

    let client = LastFmClient::from_env()?;

    let recent = match client.get_recent_tracks(&user, 10).await {
        Ok(recent) => recent,
        Err(LastFmError::Api(e)) => {
            println!("✗ Last.fm a refusé la requête ({}): {}", e.code, e.message);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    match recent.now_playing() {
        Some(track) => println!("♪ En cours : {} - {}", track.artist.name, track.name),
        None => println!("Aucune écoute en cours"),
    }

    println!("\n--- {} scrobbles au total ---", recent.total);
    for (i, track) in recent.scrobbles().enumerate() {
        let when = track
            .played_at
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        let loved = if track.loved { " ♥" } else { "" };
        println!(
            "  {}. [{}] {} - {}{}",
            i + 1,
            when,
            track.artist.name,
            track.name,
            loved
        );
    }

    println!("\n--- Profil ---");
    let info = client.get_user_info(&user).await?;
    println!("  Nom: {}", info.name);
    println!("  Écoutes: {}", info.playcount);
    if let Some(registered) = info.registered_at {
        println!("  Inscrit le: {}", registered.format("%Y-%m-%d"));
    }

    println!("\n--- Artistes du mois ---");
    let top = client
        .get_user_top_artists(&user, Period::OneMonth, 5)
        .await?;
    for artist in &top.artists {
        println!(
            "  {}. {} ({} écoutes)",
            artist.rank.unwrap_or_default(),
            artist.name,
            artist.playcount
        );
    }

    // Le second appel est servi par le cache
    let again = client.get_recent_tracks(&user, 10).await?;
    println!("\n✓ Second appel : {} titres (cache)", again.tracks.len());

    Ok(())
}
