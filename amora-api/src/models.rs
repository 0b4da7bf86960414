use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::{
    channel_members, channels, dialogues, event_images, event_members, event_tags, events,
    filter_interests, filters, interests, messages, photos, reactions, tags, user_interests, users,
};

// --- User ---

#[derive(Debug, Queryable, Identifiable, Clone)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub city: String,
    pub birthday: NaiveDate,
    pub position: String,
    pub height: i32,
    pub gender_id: i32,
    pub target_id: i32,
    pub communication_id: i32,
    pub biography: Option<String>,
    pub role: String,
    pub email_verified: bool,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub city: String,
    pub birthday: NaiveDate,
    pub position: String,
    pub height: i32,
    pub gender_id: i32,
    pub target_id: i32,
    pub communication_id: i32,
    pub biography: Option<String>,
}

#[derive(Debug, AsChangeset, Deserialize, Default)]
#[diesel(table_name = users)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub city: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub position: Option<String>,
    pub height: Option<i32>,
    pub gender_id: Option<i32>,
    pub target_id: Option<i32>,
    pub communication_id: Option<i32>,
    pub biography: Option<String>,
}

// --- Filter ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = filters, primary_key(user_id))]
pub struct Filter {
    pub user_id: Uuid,
    pub age_min: Option<i32>,
    pub age_max: Option<i32>,
    pub height_min: Option<i32>,
    pub height_max: Option<i32>,
    pub gender_id: Option<i32>,
    pub target_id: Option<i32>,
    pub communication_id: Option<i32>,
    pub city: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = filters)]
pub struct NewFilter {
    pub user_id: Uuid,
    pub age_min: Option<i32>,
    pub age_max: Option<i32>,
    pub height_min: Option<i32>,
    pub height_max: Option<i32>,
    pub gender_id: Option<i32>,
    pub target_id: Option<i32>,
    pub communication_id: Option<i32>,
    pub city: Option<String>,
}

// --- Interest ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = interests)]
pub struct Interest {
    pub id: Uuid,
    pub title: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = user_interests)]
pub struct NewUserInterest {
    pub user_id: Uuid,
    pub interest_id: Uuid,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = filter_interests)]
pub struct NewFilterInterest {
    pub user_id: Uuid,
    pub interest_id: Uuid,
}

// --- Reaction ---

#[derive(Debug, Queryable, Identifiable, Serialize)]
#[diesel(table_name = reactions)]
pub struct Reaction {
    pub id: Uuid,
    pub user_from: Uuid,
    pub user_to: Uuid,
    pub kind: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = reactions)]
pub struct NewReaction {
    pub user_from: Uuid,
    pub user_to: Uuid,
    pub kind: String,
}

// --- Dialogue ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = dialogues)]
pub struct Dialogue {
    pub id: Uuid,
    pub user_a: Uuid,
    pub user_b: Uuid,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = dialogues)]
pub struct NewDialogue {
    pub user_a: Uuid,
    pub user_b: Uuid,
}

// --- Message ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = messages)]
pub struct Message {
    pub id: Uuid,
    pub dialogue_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub edited_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = messages)]
pub struct NewMessage {
    pub dialogue_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
}

// --- Event ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = events)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub place: String,
    pub starts_at: DateTime<Utc>,
    pub creator_id: Uuid,
    pub users_limit: Option<i32>,
    pub is_online: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = events)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub place: String,
    pub starts_at: DateTime<Utc>,
    pub creator_id: Uuid,
    pub users_limit: Option<i32>,
    pub is_online: bool,
}

#[derive(Debug, AsChangeset, Deserialize, Default)]
#[diesel(table_name = events)]
pub struct UpdateEvent {
    pub title: Option<String>,
    pub description: Option<String>,
    pub place: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub users_limit: Option<i32>,
    pub is_online: Option<bool>,
}

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = tags)]
pub struct Tag {
    pub id: Uuid,
    pub title: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = tags)]
pub struct NewTag {
    pub title: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = event_tags)]
pub struct NewEventTag {
    pub event_id: Uuid,
    pub tag_id: Uuid,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = event_members)]
pub struct NewEventMember {
    pub event_id: Uuid,
    pub user_id: Uuid,
}

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = event_images)]
pub struct EventImage {
    pub id: Uuid,
    pub event_id: Uuid,
    pub url: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = event_images)]
pub struct NewEventImage {
    pub event_id: Uuid,
    pub url: String,
}

// --- Channel ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = channels)]
pub struct Channel {
    pub id: Uuid,
    pub title: String,
    pub creator_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = channels)]
pub struct NewChannel {
    pub title: String,
    pub creator_id: Uuid,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = channel_members)]
pub struct NewChannelMember {
    pub channel_id: Uuid,
    pub user_id: Uuid,
}

// --- Photo ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = photos)]
pub struct Photo {
    pub id: Uuid,
    pub user_id: Uuid,
    pub object_key: String,
    pub url: String,
    pub content_type: String,
    pub is_profile: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = photos)]
pub struct NewPhoto {
    pub user_id: Uuid,
    pub object_key: String,
    pub url: String,
    pub content_type: String,
    pub is_profile: bool,
}
