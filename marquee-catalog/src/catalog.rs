use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use marquee_core::{CatalogService, CollaboratorError, Money, SeatLayout, Showtime, ShowtimeId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

const SEED_MOVIES: &str = include_str!("../seed/movies.json");

/// A movie as it appears in the seed listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieListing {
    pub id: String,
    pub title: String,
    pub language: String,
    pub genre: String,
    /// Display price such as `Rs180`.
    pub price: String,
    pub theatres: Vec<TheatreListing>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TheatreListing {
    pub name: String,
    pub showtimes: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Invalid movie listing: {0}")]
    InvalidListing(#[from] serde_json::Error),

    #[error("Invalid price '{price}' for movie {movie_id}")]
    InvalidPrice { movie_id: String, price: String },
}

/// Catalog held in memory, materialized from movie listings.
#[derive(Default)]
pub struct InMemoryCatalog {
    showtimes: RwLock<HashMap<ShowtimeId, Showtime>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog built from the bundled seed listing.
    pub fn seeded(
        layout: SeatLayout,
        first_day: NaiveDate,
        days: u32,
        currency: &str,
    ) -> Result<Self, CatalogError> {
        let listings = seed_listings()?;
        Self::from_listings(&listings, layout, first_day, days, currency)
    }

    /// One showtime per (movie, theatre, day, time) for `days` consecutive days.
    pub fn from_listings(
        listings: &[MovieListing],
        layout: SeatLayout,
        first_day: NaiveDate,
        days: u32,
        currency: &str,
    ) -> Result<Self, CatalogError> {
        let catalog = Self::new();
        for movie in listings {
            let ticket_price = parse_price(&movie.price, currency).ok_or_else(|| {
                CatalogError::InvalidPrice {
                    movie_id: movie.id.clone(),
                    price: movie.price.clone(),
                }
            })?;

            for day in 0..days {
                let date = first_day + Duration::days(i64::from(day));
                for theatre in &movie.theatres {
                    for time in &theatre.showtimes {
                        catalog.insert(Showtime {
                            id: ShowtimeId::new(),
                            movie_id: movie.id.clone(),
                            movie_title: movie.title.clone(),
                            theatre: theatre.name.clone(),
                            date,
                            time: time.clone(),
                            ticket_price: ticket_price.clone(),
                            layout,
                        });
                    }
                }
            }
        }
        Ok(catalog)
    }

    pub fn insert(&self, showtime: Showtime) {
        let mut showtimes = self.showtimes.write().unwrap_or_else(|e| e.into_inner());
        showtimes.insert(showtime.id, showtime);
    }

    pub fn len(&self) -> usize {
        self.showtimes.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CatalogService for InMemoryCatalog {
    async fn get_showtime(&self, id: ShowtimeId) -> Result<Option<Showtime>, CollaboratorError> {
        let showtimes = self.showtimes.read().unwrap_or_else(|e| e.into_inner());
        Ok(showtimes.get(&id).cloned())
    }

    async fn list_showtimes(&self) -> Result<Vec<Showtime>, CollaboratorError> {
        let showtimes = self.showtimes.read().unwrap_or_else(|e| e.into_inner());
        let mut list: Vec<Showtime> = showtimes.values().cloned().collect();
        list.sort_by(|a, b| {
            (a.date, &a.movie_title, &a.theatre, &a.time).cmp(&(b.date, &b.movie_title, &b.theatre, &b.time))
        });
        Ok(list)
    }
}

pub fn seed_listings() -> Result<Vec<MovieListing>, CatalogError> {
    Ok(serde_json::from_str(SEED_MOVIES)?)
}

/// Parses a display price (`Rs180`, `250`, `Rs 99.50`) into minor units.
pub fn parse_price(display: &str, currency: &str) -> Option<Money> {
    let digits = display
        .trim()
        .trim_start_matches(|c: char| c.is_alphabetic())
        .trim();
    let (whole, fraction) = match digits.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (digits, "0"),
    };
    let is_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !is_digits(whole) || !is_digits(fraction) || fraction.len() > 2 {
        return None;
    }
    let whole: i64 = whole.parse().ok()?;
    let fraction: i64 = format!("{:0<2}", fraction).parse().ok()?;
    let minor = whole.checked_mul(100)?.checked_add(fraction)?;
    Some(Money::new(minor, currency))
}
