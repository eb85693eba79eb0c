//! Records for the bundled project schema.
//!
//! Generated from the collection field lists; regenerate rather than edit.

use crate::client::ClientBuilder;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

crate::directus_record! {
    /// Directus system user (subset of the system fields).
    pub struct DirectusUser in "directus_users" {
        key id: Uuid => "id";
        field first_name: Option<String> => "first_name";
        field last_name: Option<String> => "last_name";
        field email: Option<String> => "email";
        field title: Option<String> => "title";
        field description: Option<String> => "description";
        field language: Option<String> => "language";
        field provider: String => "provider";
        field status: String => "status";
        field last_access: Option<DateTime<Utc>> => "last_access";
        field telegram_chat_id: Option<String> => "telegram_chat_id";
    }
}

crate::directus_record! {
    pub struct Location in "location" {
        key id: Uuid => "id";
        field code: String => "code";
        field name: String => "name";
    }
}

crate::directus_record! {
    pub struct Product in "product" {
        key id: Uuid => "id";
        field name: String => "name";
        field description: Option<String> => "description";
        field duration: i64 => "duration";
        field price: f64 => "price";
        relation location: Location => "location";
    }
}

crate::directus_record! {
    pub struct ProxyServer in "proxy_server" {
        key id: Uuid => "id";
        field ip: String => "ip";
        field control_port: i64 => "controll_port";
        field description: Option<String> => "description";
        relation location: Location => "location";
    }
}

crate::directus_record! {
    pub struct Promocode in "promocode" {
        key id: Uuid => "id";
        field code: String => "code";
        field discount: f64 => "discount";
        field date_created: Option<DateTime<Utc>> => "date_created";
        field date_updated: Option<DateTime<Utc>> => "date_updated";
        relation user_created: DirectusUser => "user_created";
        relation user_updated: DirectusUser => "user_updated";
    }
}

crate::directus_record! {
    pub struct Transaction in "transaction" {
        key id: Uuid => "id";
        field date_created: Option<DateTime<Utc>> => "date_created";
        field date_updated: Option<DateTime<Utc>> => "date_updated";
        field metadata: Option<Value> => "metadata";
        relation user_created: DirectusUser => "user_created";
        relation user_updated: DirectusUser => "user_updated";
    }
}

crate::directus_record! {
    /// Rented proxy slot; the widest graph in the schema.
    pub struct Slot in "slot" {
        key id: Uuid => "id";
        field annotation: Option<String> => "annotation";
        field connection_port: i64 => "connection_port";
        field date_created: Option<DateTime<Utc>> => "date_created";
        field date_updated: Option<DateTime<Utc>> => "date_updated";
        field expires_at: DateTime<Utc> => "expires_at";
        field password_base64: String => "password_base64";
        field status: Option<String> => "status";
        relation product: Product => "product";
        relation server: ProxyServer => "server";
        relation transaction: Transaction => "transaction";
        relation used_promocode: Promocode => "used_promocode";
        relation user: DirectusUser => "user";
        relation user_created: DirectusUser => "user_created";
        relation user_updated: DirectusUser => "user_updated";
    }
}

/// Registers an accessor for every bundled collection.
pub fn register_all(builder: ClientBuilder) -> ClientBuilder {
    builder
        .register::<DirectusUser>()
        .register::<Location>()
        .register::<Product>()
        .register::<ProxyServer>()
        .register::<Promocode>()
        .register::<Transaction>()
        .register::<Slot>()
}
