//! Normalisation post-décodage
//!
//! Certaines valeurs n'ont pas dans le XML la forme voulue en mémoire :
//! dates (timestamp Unix ou texte à format fixe), durées en millisecondes,
//! jeton de période. Chaque type de résultat implémente [`Normalize`] pour
//! dériver ces champs ; le dispatcher l'appelle une seule fois, après avoir
//! vérifié l'absence d'erreur dans l'enveloppe.
//!
//! Seules les conversions de dates et de durées peuvent échouer. Un champ
//! brut vide laisse le champ dérivé à `None`.

use crate::error::NormalizeError;
use crate::models::*;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::time::Duration;

/// Format des dates de publication des wikis
const WIKI_DATE_FORMAT: &str = "%d %b %Y, %H:%M";

/// Dérivation des champs en mémoire depuis les champs bruts
pub trait Normalize {
    fn normalize(&mut self) -> Result<(), NormalizeError> {
        Ok(())
    }
}

fn from_epoch(field: &'static str, seconds: i64) -> Result<DateTime<Utc>, NormalizeError> {
    DateTime::from_timestamp(seconds, 0).ok_or_else(|| NormalizeError::Timestamp {
        field,
        value: seconds.to_string(),
    })
}

fn parse_wiki_date(field: &'static str, raw: &str) -> Result<DateTime<Utc>, NormalizeError> {
    NaiveDateTime::parse_from_str(raw.trim(), WIKI_DATE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|source| NormalizeError::Date {
            field,
            value: raw.to_string(),
            source,
        })
}

fn parse_millis(field: &'static str, raw: &str) -> Result<Duration, NormalizeError> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|source| NormalizeError::Duration {
            field,
            value: raw.to_string(),
            source,
        })
}

impl Normalize for Track {
    fn normalize(&mut self) -> Result<(), NormalizeError> {
        self.played_at = match &self.raw_date {
            Some(date) if !date.text.is_empty() => Some(from_epoch("track.date", date.uts)?),
            _ => None,
        };
        Ok(())
    }
}

impl Normalize for RecentTracks {
    fn normalize(&mut self) -> Result<(), NormalizeError> {
        self.now_playing_index = None;
        for (i, track) in self.tracks.iter_mut().enumerate() {
            if track.now_playing {
                self.now_playing_index = Some(i);
            }
            track.normalize()?;
        }
        Ok(())
    }
}

impl Normalize for Wiki {
    fn normalize(&mut self) -> Result<(), NormalizeError> {
        self.published_at = if self.raw_published.is_empty() {
            None
        } else {
            Some(parse_wiki_date("wiki.published", &self.raw_published)?)
        };
        Ok(())
    }
}

impl Normalize for TopArtists {
    fn normalize(&mut self) -> Result<(), NormalizeError> {
        self.period = Period::from_wire(&self.raw_period);
        Ok(())
    }
}

impl Normalize for ArtistInfo {
    fn normalize(&mut self) -> Result<(), NormalizeError> {
        if let Some(bio) = self.bio.as_mut() {
            bio.normalize()?;
        }
        Ok(())
    }
}

impl Normalize for TrackInfo {
    fn normalize(&mut self) -> Result<(), NormalizeError> {
        self.length = if self.raw_duration.trim().is_empty() {
            None
        } else {
            Some(parse_millis("track.duration", &self.raw_duration)?)
        };
        if let Some(wiki) = self.wiki.as_mut() {
            wiki.normalize()?;
        }
        Ok(())
    }
}

impl Normalize for User {
    fn normalize(&mut self) -> Result<(), NormalizeError> {
        self.registered_at = match &self.raw_registered {
            Some(registered) if !registered.unixtime.trim().is_empty() => {
                let raw = registered.unixtime.trim();
                let seconds = raw.parse::<i64>().map_err(|_| NormalizeError::Timestamp {
                    field: "user.registered",
                    value: raw.to_string(),
                })?;
                Some(from_epoch("user.registered", seconds)?)
            }
            _ => None,
        };
        Ok(())
    }
}

impl Normalize for Tasteometer {}
impl Normalize for Neighbours {}
impl Normalize for TopTags {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn track(name: &str, now_playing: bool, uts: Option<i64>) -> Track {
        Track {
            name: name.to_string(),
            now_playing,
            raw_date: uts.map(|uts| LfmDate {
                uts,
                text: "some date".to_string(),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_track_epoch_date() {
        let mut t = track("a", false, Some(1_287_654_321));
        t.normalize().unwrap();
        assert_eq!(t.played_at, DateTime::from_timestamp(1_287_654_321, 0));
    }

    #[test]
    fn test_track_date_absent_or_flag_empty() {
        let mut t = track("a", false, None);
        t.normalize().unwrap();
        assert!(t.played_at.is_none());

        let mut t = Track {
            raw_date: Some(LfmDate {
                uts: 1_287_654_321,
                text: String::new(),
            }),
            ..Default::default()
        };
        t.normalize().unwrap();
        assert!(t.played_at.is_none());
    }

    #[test]
    fn test_track_epoch_out_of_range() {
        let mut t = track("a", false, Some(i64::MAX));
        assert!(matches!(
            t.normalize(),
            Err(NormalizeError::Timestamp { .. })
        ));
    }

    #[test]
    fn test_now_playing_points_into_list() {
        let mut recent = RecentTracks {
            tracks: vec![
                track("playing", true, None),
                track("first", false, Some(100)),
                track("second", false, Some(50)),
            ],
            ..Default::default()
        };
        recent.normalize().unwrap();

        assert_eq!(recent.now_playing_index(), Some(0));
        assert!(std::ptr::eq(
            recent.now_playing().unwrap(),
            &recent.tracks[0]
        ));

        recent.now_playing_mut().unwrap().loved = true;
        assert!(recent.tracks[0].loved);

        recent.tracks[0].name = "renamed".to_string();
        assert_eq!(recent.now_playing().unwrap().name, "renamed");
    }

    #[test]
    fn test_recent_tracks_without_now_playing() {
        let mut recent = RecentTracks {
            tracks: vec![track("first", false, Some(100))],
            ..Default::default()
        };
        recent.normalize().unwrap();
        assert!(recent.now_playing().is_none());
        assert!(recent.tracks[0].played_at.is_some());
    }

    #[test]
    fn test_top_artists_period() {
        let mut top = TopArtists {
            raw_period: "7day".to_string(),
            ..Default::default()
        };
        top.normalize().unwrap();
        assert_eq!(top.period, Some(Period::OneWeek));

        let mut top = TopArtists {
            raw_period: "fortnight".to_string(),
            ..Default::default()
        };
        top.normalize().unwrap();
        assert_eq!(top.period, None);
    }

    #[test]
    fn test_wiki_published() {
        let mut wiki = Wiki {
            raw_published: "02 Jan 2006, 15:04".to_string(),
            ..Default::default()
        };
        wiki.normalize().unwrap();
        assert_eq!(
            wiki.published_at,
            Some(Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 0).unwrap())
        );

        let mut wiki = Wiki::default();
        wiki.normalize().unwrap();
        assert!(wiki.published_at.is_none());

        let mut wiki = Wiki {
            raw_published: "yesterday".to_string(),
            ..Default::default()
        };
        assert!(matches!(wiki.normalize(), Err(NormalizeError::Date { .. })));
    }

    #[test]
    fn test_track_info_duration() {
        let mut info = TrackInfo {
            raw_duration: "240000".to_string(),
            ..Default::default()
        };
        info.normalize().unwrap();
        assert_eq!(info.length, Some(Duration::from_secs(240)));

        let mut info = TrackInfo::default();
        info.normalize().unwrap();
        assert!(info.length.is_none());

        let mut info = TrackInfo {
            raw_duration: "4 minutes".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            info.normalize(),
            Err(NormalizeError::Duration { .. })
        ));
    }

    #[test]
    fn test_artist_info_bio() {
        let mut info = ArtistInfo {
            bio: Some(Wiki {
                raw_published: "13 Feb 2009, 11:30".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        };
        info.normalize().unwrap();
        assert!(info.bio.unwrap().published_at.is_some());
    }

    #[test]
    fn test_user_registered() {
        let mut user = User {
            raw_registered: Some(Registered {
                unixtime: "1037793040".to_string(),
                text: "2002-11-20 11:50".to_string(),
            }),
            ..Default::default()
        };
        user.normalize().unwrap();
        assert_eq!(user.registered_at, DateTime::from_timestamp(1_037_793_040, 0));

        let mut user = User::default();
        user.normalize().unwrap();
        assert!(user.registered_at.is_none());
    }
}
