use std::error::Error;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use super::{Rating, User};

#[derive(Debug, Deserialize)]
struct UserRow {
  #[serde(rename = "userId")]
  user_id: u32,
  gender: String,
  age: Option<f32>,
  occupation: f32,
}

#[derive(Debug, Deserialize)]
struct RatingRow {
  #[serde(rename = "userId")]
  user_id: u32,
  #[serde(rename = "movieId")]
  movie_id: u32,
  rating: f32,
}

fn gender_value(raw: &str) -> Result<f32, Box<dyn Error>> {
  match raw {
    "M" | "m" => Ok(0.0),
    "F" | "f" => Ok(1.0),
    other => Ok(other.parse::<f32>()?),
  }
}

/// Parses the users csv. Rows with an empty age cell are dropped; a user
/// of unknown age is useless as rating context.
pub fn parse_users(input: impl Read) -> Result<Vec<User>, Box<dyn Error>> {
  let mut reader = csv::ReaderBuilder::new()
    .trim(csv::Trim::All)
    .from_reader(input);
  let mut users = Vec::new();
  let mut dropped = 0usize;
  for row in reader.deserialize() {
    let row: UserRow = row?;
    let age = match row.age {
      Some(age) => age,
      None => {
        dropped += 1;
        continue;
      }
    };
    users.push(User {
      user_id: row.user_id,
      gender: gender_value(&row.gender)?,
      age,
      occupation: row.occupation,
    });
  }
  if dropped > 0 {
    debug!("dropped {dropped} users with an empty age column");
  }
  Ok(users)
}

pub fn parse_ratings(input: impl Read) -> Result<Vec<Rating>, Box<dyn Error>> {
  let mut reader = csv::ReaderBuilder::new()
    .trim(csv::Trim::All)
    .from_reader(input);
  let mut ratings = Vec::new();
  for row in reader.deserialize() {
    let row: RatingRow = row?;
    ratings.push(Rating {
      user_id: row.user_id,
      movie_id: row.movie_id,
      rating: row.rating,
    });
  }
  Ok(ratings)
}

pub fn read_users(path: &Path) -> Result<Vec<User>, Box<dyn Error>> {
  let file = match std::fs::File::open(path) {
    Ok(file) => file,
    Err(e) => panic!("Failed to read file {:?}: {}", path, e),
  };
  parse_users(file)
}

pub fn read_ratings(path: &Path) -> Result<Vec<Rating>, Box<dyn Error>> {
  let file = match std::fs::File::open(path) {
    Ok(file) => file,
    Err(e) => panic!("Failed to read file {:?}: {}", path, e),
  };
  parse_ratings(file)
}
