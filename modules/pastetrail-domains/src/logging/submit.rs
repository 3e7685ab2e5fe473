use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use pastetrail_common::{Error, Result};

use crate::designs::Design;
use crate::photos::PhotoStore;
use crate::sightings::Sighting;
use crate::stickers::Sticker;

use super::session::{DesignChoice, LogSession, StickerChoice};

/// Outcome of a submitted session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub sighting: Sighting,
    pub sticker_id: Uuid,
    pub design_id: Uuid,
    pub design_created: bool,
    pub sticker_created: bool,
}

/// Run the terminal step of a logging session, strictly in order:
///
/// 1. upload the photo, obtaining a stable reference — deliberately first,
///    so no entity can ever reference a photo that failed to persist;
/// 2. materialize a staged new design (first use);
/// 3. create the sticker at the captured coordinates unless an existing one
///    was bound;
/// 4. append the sighting.
///
/// Any failure aborts the submission and leaves the session value untouched,
/// so the caller can retry without re-entering data. Steps 2–4 are
/// non-idempotent creates; a retry after a mid-flight crash can duplicate
/// designs or stickers (the duplicate-placement guard in sticker creation
/// downgrades the sticker case to a `Conflict`).
pub async fn submit(
    session: &LogSession,
    user_id: Uuid,
    photos: &dyn PhotoStore,
    threshold_meters: f64,
    pool: &PgPool,
) -> Result<Submission> {
    // Unreachable through the state machine; a raw caller gets a clear error.
    let design_choice = session
        .design
        .as_ref()
        .ok_or_else(|| Error::Validation("no design chosen for this session".to_string()))?;
    let sticker_choice = session
        .sticker
        .as_ref()
        .ok_or_else(|| Error::Validation("sticker decision not resolved".to_string()))?;

    let photo_uri = photos
        .put(&session.photo.bytes, &session.photo.content_type)
        .await?;

    let (design_id, design_created) = match design_choice {
        DesignChoice::Existing(id) => {
            // Fail before creating anything if the id is stale.
            let design = Design::find_by_id(*id, pool).await?;
            (design.id, false)
        }
        DesignChoice::New(staged) => {
            let design = Design::create(
                &staged.name,
                &staged.description,
                &staged.text,
                &photo_uri,
                user_id,
                pool,
            )
            .await?;
            (design.id, true)
        }
    };

    let (sticker_id, sticker_created) = match sticker_choice {
        StickerChoice::Existing(id) => (*id, false),
        StickerChoice::CreateNew => {
            let sticker = Sticker::create(
                design_id,
                session.location,
                &session.location_description,
                threshold_meters,
                pool,
            )
            .await?;
            (sticker.id, true)
        }
    };

    let sighting = Sighting::append(
        sticker_id,
        design_id,
        user_id,
        &photo_uri,
        &session.note,
        pool,
    )
    .await?;

    info!(
        sighting_id = %sighting.id,
        sticker_id = %sticker_id,
        design_id = %design_id,
        design_created,
        sticker_created,
        "submitted sighting"
    );

    Ok(Submission {
        sighting,
        sticker_id,
        design_id,
        design_created,
        sticker_created,
    })
}
