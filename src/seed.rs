// Initial room catalogue

use anyhow::Context;
use std::path::Path;
use validator::Validate;

use crate::model::Room;
use crate::rooms::RoomCatalog;

// Sample catalogue file (also bundled into the crate as DEFAULT_ROOMS_JSON)
pub const SAMPLE_ROOMS_PATH: &str = "samples/rooms.json";

pub const DEFAULT_ROOMS_JSON: &str = include_str!("../samples/rooms.json");

pub fn parse_rooms(json: &str) -> anyhow::Result<Vec<Room>> {
    let rooms: Vec<Room> = serde_json::from_str(json).context("failed to parse room catalogue")?;
    for room in &rooms {
        room.validate()
            .with_context(|| format!("invalid room {} in catalogue", room.room_number))?;
    }
    Ok(rooms)
}

pub fn load_rooms(path: impl AsRef<Path>) -> anyhow::Result<Vec<Room>> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read room catalogue from {}", path.display()))?;
    parse_rooms(&json)
}

// Saves every room in order; returns the stored rooms with their ids
pub async fn seed_rooms(catalog: &RoomCatalog, rooms: Vec<Room>) -> anyhow::Result<Vec<Room>> {
    let mut saved = Vec::with_capacity(rooms.len());
    for room in rooms {
        let number = room.room_number.clone();
        let room = catalog
            .save_room(room)
            .await
            .with_context(|| format!("failed to seed room {number}"))?;
        saved.push(room);
    }
    tracing::info!(rooms = saved.len(), "room catalogue seeded");
    Ok(saved)
}

pub async fn seed_default_rooms(catalog: &RoomCatalog) -> anyhow::Result<Vec<Room>> {
    seed_rooms(catalog, parse_rooms(DEFAULT_ROOMS_JSON)?).await
}
