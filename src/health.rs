//! Liveness check served at `/`.
//!
//! If the process can answer HTTP at all, it is alive: the handler touches no
//! dependencies, so a missing database never fails it. Use `/test` to ask
//! about the database.

use serde::Serialize;

use crate::{Json, Request};

#[derive(Serialize)]
pub struct Liveness {
    pub message: &'static str,
}

/// Always `200 OK` with `{"message": "MAFFA Backend Running"}`.
pub async fn liveness(_req: Request) -> Json<Liveness> {
    Json(Liveness { message: "MAFFA Backend Running" })
}
