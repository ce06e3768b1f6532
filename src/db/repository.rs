//! Database repository for all persistence operations.
//!
//! Uses prepared statements, conditional updates for the lifecycle
//! check-and-set paths, and transactions for stock movements.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{
    ContactMessage, ContactStatus, GeoPoint, InventoryItem, ItemCategory, RequestKind,
    RequestedItem, ResourceRequest, ResourceStatus, ResourceView, Role, SosAnalytics, SosRequest,
    SosStatus, SosView, StockStatus, Urgency, User, UserSummary,
};

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

/// Lowercased, trimmed item name used to merge inventory lines
/// case-insensitively on approval deduction and donation absorption.
pub fn name_key(item_name: &str) -> String {
    item_name.trim().to_lowercase()
}

/// Parse a free-form quantity string the way the intake forms produce them:
/// take the leading integer ("20 boxes" -> 20), default to 0.
pub fn parse_quantity(raw: &str) -> i64 {
    let digits: String = raw
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==================== USER & SESSION OPERATIONS ====================

    /// Create a new user. Fails with Conflict when the email is taken.
    pub async fn create_user(
        &self,
        full_name: &str,
        email: &str,
        phone: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, AppError> {
        let existing = sqlx::query("SELECT id FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(AppError::Conflict("User already exists".to_string()));
        }

        let id = new_id();
        let now = now();

        sqlx::query(
            "INSERT INTO users (id, full_name, email, phone, password_hash, role, location_lng, location_lat, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, 0, 0, ?, ?)"
        )
        .bind(&id)
        .bind(full_name)
        .bind(email)
        .bind(phone)
        .bind(password_hash)
        .bind(role.as_str())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(User {
            id,
            full_name: full_name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            role,
            location: GeoPoint::origin(),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Get a user by ID.
    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query(
            "SELECT id, full_name, email, phone, role, location_lng, location_lat, created_at, updated_at FROM users WHERE id = ?"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    /// Get a user and their password digest by email, for login verification.
    pub async fn get_user_auth(&self, email: &str) -> Result<Option<(User, String)>, AppError> {
        let row = sqlx::query(
            "SELECT id, full_name, email, phone, role, location_lng, location_lat, password_hash, created_at, updated_at FROM users WHERE email = ?"
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(|r| (user_from_row(r), r.get("password_hash"))))
    }

    /// List all users, newest first.
    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let rows = sqlx::query(
            "SELECT id, full_name, email, phone, role, location_lng, location_lat, created_at, updated_at FROM users ORDER BY created_at DESC"
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(user_from_row).collect())
    }

    /// List users holding the volunteer role, for the admin dispatch board.
    pub async fn list_volunteers(&self) -> Result<Vec<UserSummary>, AppError> {
        let rows = sqlx::query(
            "SELECT id, full_name, email, phone FROM users WHERE role = 'volunteer' ORDER BY full_name"
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| UserSummary {
                id: row.get("id"),
                full_name: row.get("full_name"),
                email: row.get("email"),
                phone: row.get("phone"),
            })
            .collect())
    }

    /// Ids of every user except the given one, for SOS broadcast fan-out.
    pub async fn list_user_ids_except(&self, user_id: &str) -> Result<Vec<String>, AppError> {
        let rows = sqlx::query("SELECT id FROM users WHERE id != ?")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|row| row.get("id")).collect())
    }

    /// Update name/phone/role on a user. Role stays untouched when None.
    pub async fn update_user_profile(
        &self,
        id: &str,
        full_name: Option<&str>,
        phone: Option<&str>,
        role: Option<Role>,
    ) -> Result<User, AppError> {
        let existing = self
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

        let full_name = full_name.unwrap_or(&existing.full_name);
        let phone = phone.unwrap_or(&existing.phone);
        let role = role.unwrap_or(existing.role);
        let now = now();

        sqlx::query(
            "UPDATE users SET full_name = ?, phone = ?, role = ?, updated_at = ? WHERE id = ?",
        )
        .bind(full_name)
        .bind(phone)
        .bind(role.as_str())
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(User {
            full_name: full_name.to_string(),
            phone: phone.to_string(),
            role,
            updated_at: now,
            ..existing
        })
    }

    /// Overwrite a user's last-known location.
    pub async fn update_user_location(
        &self,
        id: &str,
        location: &GeoPoint,
    ) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE users SET location_lng = ?, location_lat = ?, updated_at = ? WHERE id = ?",
        )
        .bind(location.longitude())
        .bind(location.latitude())
        .bind(now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Delete a user and all of their sessions.
    pub async fn delete_user(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {} not found", id)));
        }

        sqlx::query("DELETE FROM sessions WHERE user_id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Store a password-reset token on the user with the given email.
    /// Returns the matched user, or None when the email is unknown.
    pub async fn set_reset_token(
        &self,
        email: &str,
        token: &str,
    ) -> Result<Option<User>, AppError> {
        let result = sqlx::query("UPDATE users SET reset_token = ?, updated_at = ? WHERE email = ?")
            .bind(token)
            .bind(now())
            .bind(email)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        let row = sqlx::query(
            "SELECT id, full_name, email, phone, role, location_lng, location_lat, created_at, updated_at FROM users WHERE email = ?"
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    /// Consume a reset token: set the new password digest and clear the token.
    pub async fn reset_password(
        &self,
        token: &str,
        password_hash: &str,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = ?, reset_token = NULL, updated_at = ? WHERE reset_token = ?"
        )
        .bind(password_hash)
        .bind(now())
        .bind(token)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(
                "Invalid or expired reset token".to_string(),
            ));
        }

        Ok(())
    }

    /// Issue an opaque bearer token for the user.
    pub async fn create_session(&self, user_id: &str) -> Result<String, AppError> {
        let token = new_id();

        sqlx::query("INSERT INTO sessions (token, user_id, created_at) VALUES (?, ?, ?)")
            .bind(&token)
            .bind(user_id)
            .bind(now())
            .execute(&self.pool)
            .await?;

        Ok(token)
    }

    /// Resolve a bearer token to the user it was issued to.
    pub async fn get_session_user(&self, token: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query(
            "SELECT u.id, u.full_name, u.email, u.phone, u.role, u.location_lng, u.location_lat, u.created_at, u.updated_at
             FROM sessions s JOIN users u ON u.id = s.user_id WHERE s.token = ?"
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    /// Fetch minimal user summaries for a set of ids. Unknown ids (including
    /// the synthetic admin) are simply absent from the map.
    async fn user_summaries(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, UserSummary>, AppError> {
        let mut unique: Vec<&String> = ids.iter().collect();
        unique.sort();
        unique.dedup();

        let mut map = HashMap::new();
        for id in unique {
            let row = sqlx::query("SELECT id, full_name, phone FROM users WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
            if let Some(row) = row {
                map.insert(
                    id.clone(),
                    UserSummary {
                        id: row.get("id"),
                        full_name: row.get("full_name"),
                        email: None,
                        phone: row.get("phone"),
                    },
                );
            }
        }

        Ok(map)
    }

    // ==================== SOS OPERATIONS ====================

    /// Create a new SOS incident with status pending and no volunteer.
    pub async fn create_sos(
        &self,
        user_id: &str,
        sos_type: &str,
        description: Option<&str>,
        image: Option<&str>,
        required_items: &[RequestedItem],
        location: &GeoPoint,
    ) -> Result<SosRequest, AppError> {
        let id = new_id();
        let now = now();
        let items_json = serde_json::to_string(required_items)?;

        sqlx::query(
            r#"INSERT INTO sos_requests (
                id, user_id, type, description, image, required_items,
                location_lng, location_lat, location_accuracy,
                status, assigned_volunteer, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 'pending', NULL, ?, ?)"#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(sos_type)
        .bind(description)
        .bind(image)
        .bind(&items_json)
        .bind(location.longitude())
        .bind(location.latitude())
        .bind(location.accuracy)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(SosRequest {
            id,
            user_id: user_id.to_string(),
            sos_type: sos_type.to_string(),
            description: description.map(str::to_string),
            image: image.map(str::to_string),
            required_items: required_items.to_vec(),
            location: location.clone(),
            status: SosStatus::Pending,
            assigned_volunteer: None,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Get an SOS by ID.
    pub async fn get_sos(&self, id: &str) -> Result<Option<SosRequest>, AppError> {
        let row = sqlx::query(
            "SELECT id, user_id, type, description, image, required_items, location_lng, location_lat, location_accuracy, status, assigned_volunteer, created_at, updated_at FROM sos_requests WHERE id = ?"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(sos_from_row))
    }

    /// All SOS not yet resolved (cancelled included), newest first,
    /// enriched with owner, volunteer and linked resource requests.
    pub async fn list_open_sos(&self) -> Result<Vec<SosView>, AppError> {
        let rows = sqlx::query(
            "SELECT id, user_id, type, description, image, required_items, location_lng, location_lat, location_accuracy, status, assigned_volunteer, created_at, updated_at FROM sos_requests WHERE status != 'resolved' ORDER BY created_at DESC"
        )
        .fetch_all(&self.pool)
        .await?;

        let alerts: Vec<SosRequest> = rows.iter().map(sos_from_row).collect();
        self.enrich_sos(alerts).await
    }

    /// SOS owned by the given user, newest first, with linked resources.
    pub async fn list_sos_by_owner(&self, user_id: &str) -> Result<Vec<SosView>, AppError> {
        let rows = sqlx::query(
            "SELECT id, user_id, type, description, image, required_items, location_lng, location_lat, location_accuracy, status, assigned_volunteer, created_at, updated_at FROM sos_requests WHERE user_id = ? ORDER BY created_at DESC"
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let alerts: Vec<SosRequest> = rows.iter().map(sos_from_row).collect();
        self.enrich_sos(alerts).await
    }

    /// SOS where the given user is the assigned volunteer, any status,
    /// newest-updated first.
    pub async fn list_volunteer_history(&self, volunteer_id: &str) -> Result<Vec<SosView>, AppError> {
        let rows = sqlx::query(
            "SELECT id, user_id, type, description, image, required_items, location_lng, location_lat, location_accuracy, status, assigned_volunteer, created_at, updated_at FROM sos_requests WHERE assigned_volunteer = ? ORDER BY updated_at DESC"
        )
        .bind(volunteer_id)
        .fetch_all(&self.pool)
        .await?;

        let alerts: Vec<SosRequest> = rows.iter().map(sos_from_row).collect();
        self.enrich_sos(alerts).await
    }

    /// Full dataset projected to minimal fields for aggregate reporting.
    pub async fn list_sos_analytics(&self) -> Result<Vec<SosAnalytics>, AppError> {
        let rows = sqlx::query(
            "SELECT id, type, status, created_at, location_lng, location_lat FROM sos_requests ORDER BY created_at DESC"
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let status: String = row.get("status");
                SosAnalytics {
                    id: row.get("id"),
                    sos_type: row.get("type"),
                    status: SosStatus::parse(&status).unwrap_or(SosStatus::Pending),
                    created_at: row.get("created_at"),
                    location: GeoPoint::new(row.get("location_lng"), row.get("location_lat")),
                }
            })
            .collect())
    }

    /// Volunteer self-service claim. Atomic check-and-set: only one caller
    /// can win while `assigned_volunteer` is still NULL; losers get Conflict.
    pub async fn accept_sos(
        &self,
        sos_id: &str,
        volunteer_id: &str,
    ) -> Result<SosRequest, AppError> {
        let result = sqlx::query(
            "UPDATE sos_requests SET assigned_volunteer = ?, status = 'accepted', updated_at = ? WHERE id = ? AND assigned_volunteer IS NULL"
        )
        .bind(volunteer_id)
        .bind(now())
        .bind(sos_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return match self.get_sos(sos_id).await? {
                Some(_) => Err(AppError::Conflict("Task already taken".to_string())),
                None => Err(AppError::NotFound(format!("SOS {} not found", sos_id))),
            };
        }

        self.get_sos(sos_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("SOS {} not found", sos_id)))
    }

    /// Admin-directed assignment. Last-write-wins by design: an admin may
    /// reassign a task that already has a volunteer.
    pub async fn assign_sos(
        &self,
        sos_id: &str,
        volunteer_id: &str,
    ) -> Result<SosRequest, AppError> {
        let result = sqlx::query(
            "UPDATE sos_requests SET assigned_volunteer = ?, status = 'accepted', updated_at = ? WHERE id = ?"
        )
        .bind(volunteer_id)
        .bind(now())
        .bind(sos_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("SOS {} not found", sos_id)));
        }

        self.get_sos(sos_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("SOS {} not found", sos_id)))
    }

    /// Overwrite an SOS status. Transitions are deliberately unchecked;
    /// accepted links the acting user as volunteer, pending clears the link.
    pub async fn update_sos_status(
        &self,
        sos_id: &str,
        status: SosStatus,
        acting_user_id: &str,
    ) -> Result<SosRequest, AppError> {
        let existing = self
            .get_sos(sos_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("SOS {} not found", sos_id)))?;

        let assigned_volunteer = match status {
            SosStatus::Accepted => Some(acting_user_id.to_string()),
            SosStatus::Pending => None,
            _ => existing.assigned_volunteer.clone(),
        };
        let now = now();

        sqlx::query(
            "UPDATE sos_requests SET status = ?, assigned_volunteer = ?, updated_at = ? WHERE id = ?",
        )
        .bind(status.as_str())
        .bind(&assigned_volunteer)
        .bind(&now)
        .bind(sos_id)
        .execute(&self.pool)
        .await?;

        Ok(SosRequest {
            status,
            assigned_volunteer,
            updated_at: now,
            ..existing
        })
    }

    /// Attach owner/volunteer summaries and the live sos_id join.
    async fn enrich_sos(&self, alerts: Vec<SosRequest>) -> Result<Vec<SosView>, AppError> {
        let mut ids: Vec<String> = alerts.iter().map(|s| s.user_id.clone()).collect();
        ids.extend(alerts.iter().filter_map(|s| s.assigned_volunteer.clone()));
        let summaries = self.user_summaries(&ids).await?;

        let mut views = Vec::with_capacity(alerts.len());
        for sos in alerts {
            let linked_resources = self.list_resources_for_sos(&sos.id).await?;
            let owner = summaries.get(&sos.user_id).cloned();
            let volunteer = sos
                .assigned_volunteer
                .as_ref()
                .and_then(|v| summaries.get(v).cloned());
            views.push(SosView {
                sos,
                owner,
                volunteer,
                linked_resources,
            });
        }

        Ok(views)
    }

    // ==================== RESOURCE REQUEST OPERATIONS ====================

    /// Create a supply request with status pending.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_resource(
        &self,
        user_id: &str,
        kind: RequestKind,
        items: &[RequestedItem],
        urgency: Urgency,
        notes: Option<&str>,
        sos_id: Option<&str>,
        location: &GeoPoint,
    ) -> Result<ResourceRequest, AppError> {
        let id = new_id();
        let now = now();
        let items_json = serde_json::to_string(items)?;

        sqlx::query(
            r#"INSERT INTO resource_requests (
                id, user_id, sos_id, kind, items, donor_id, urgency, notes,
                status, location_lng, location_lat, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, NULL, ?, ?, 'pending', ?, ?, ?, ?)"#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(sos_id)
        .bind(kind.as_str())
        .bind(&items_json)
        .bind(urgency.as_str())
        .bind(notes)
        .bind(location.longitude())
        .bind(location.latitude())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(ResourceRequest {
            id,
            user_id: user_id.to_string(),
            sos_id: sos_id.map(str::to_string),
            kind,
            items: items.to_vec(),
            donor_id: None,
            urgency,
            notes: notes.map(str::to_string),
            status: ResourceStatus::Pending,
            location: location.clone(),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Get a resource request by ID.
    pub async fn get_resource(&self, id: &str) -> Result<Option<ResourceRequest>, AppError> {
        let row = sqlx::query(
            "SELECT id, user_id, sos_id, kind, items, donor_id, urgency, notes, status, location_lng, location_lat, created_at, updated_at FROM resource_requests WHERE id = ?"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(resource_from_row))
    }

    /// The derived relation behind linkedResources: every request whose
    /// sos_id matches, recomputed on each read so later requests show up.
    pub async fn list_resources_for_sos(
        &self,
        sos_id: &str,
    ) -> Result<Vec<ResourceRequest>, AppError> {
        let rows = sqlx::query(
            "SELECT id, user_id, sos_id, kind, items, donor_id, urgency, notes, status, location_lng, location_lat, created_at, updated_at FROM resource_requests WHERE sos_id = ? ORDER BY created_at DESC"
        )
        .bind(sos_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(resource_from_row).collect())
    }

    /// Requests owned by the given user, newest first.
    pub async fn list_resources_by_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<ResourceRequest>, AppError> {
        let rows = sqlx::query(
            "SELECT id, user_id, sos_id, kind, items, donor_id, urgency, notes, status, location_lng, location_lat, created_at, updated_at FROM resource_requests WHERE user_id = ? ORDER BY created_at DESC"
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(resource_from_row).collect())
    }

    /// All pending requests for the triage board, most urgent first then
    /// most recent, enriched with requester contact details.
    pub async fn list_pending_resources(&self) -> Result<Vec<ResourceView>, AppError> {
        let rows = sqlx::query(
            r#"SELECT id, user_id, sos_id, kind, items, donor_id, urgency, notes, status, location_lng, location_lat, created_at, updated_at
               FROM resource_requests WHERE status = 'pending'
               ORDER BY CASE urgency WHEN 'High' THEN 2 WHEN 'Medium' THEN 1 ELSE 0 END DESC, created_at DESC"#,
        )
        .fetch_all(&self.pool)
        .await?;

        let requests: Vec<ResourceRequest> = rows.iter().map(resource_from_row).collect();
        self.enrich_resources(requests).await
    }

    /// Pledges made by the given donor, newest-updated first.
    pub async fn list_donations_by_donor(
        &self,
        donor_id: &str,
    ) -> Result<Vec<ResourceView>, AppError> {
        let rows = sqlx::query(
            "SELECT id, user_id, sos_id, kind, items, donor_id, urgency, notes, status, location_lng, location_lat, created_at, updated_at FROM resource_requests WHERE donor_id = ? ORDER BY updated_at DESC"
        )
        .bind(donor_id)
        .fetch_all(&self.pool)
        .await?;

        let requests: Vec<ResourceRequest> = rows.iter().map(resource_from_row).collect();
        self.enrich_resources(requests).await
    }

    /// Anything past pure pending/rejected: the in-flight logistics queue.
    pub async fn list_logistics_tasks(&self) -> Result<Vec<ResourceView>, AppError> {
        let rows = sqlx::query(
            "SELECT id, user_id, sos_id, kind, items, donor_id, urgency, notes, status, location_lng, location_lat, created_at, updated_at FROM resource_requests WHERE status IN ('fulfilled', 'dispatched', 'collected', 'delivered') ORDER BY updated_at DESC"
        )
        .fetch_all(&self.pool)
        .await?;

        let requests: Vec<ResourceRequest> = rows.iter().map(resource_from_row).collect();
        self.enrich_resources(requests).await
    }

    /// Completed and dispatched records for audit, newest-updated first.
    pub async fn list_distribution_history(&self) -> Result<Vec<ResourceView>, AppError> {
        let rows = sqlx::query(
            "SELECT id, user_id, sos_id, kind, items, donor_id, urgency, notes, status, location_lng, location_lat, created_at, updated_at FROM resource_requests WHERE status IN ('dispatched', 'delivered') ORDER BY updated_at DESC"
        )
        .fetch_all(&self.pool)
        .await?;

        let requests: Vec<ResourceRequest> = rows.iter().map(resource_from_row).collect();
        self.enrich_resources(requests).await
    }

    /// Record a donor pledge against a pending request. No inventory effect;
    /// stock only moves on physical confirmation.
    pub async fn fulfill_resource(
        &self,
        request_id: &str,
        donor_id: &str,
    ) -> Result<ResourceRequest, AppError> {
        let result = sqlx::query(
            "UPDATE resource_requests SET status = 'fulfilled', donor_id = ?, updated_at = ? WHERE id = ? AND status = 'pending'"
        )
        .bind(donor_id)
        .bind(now())
        .bind(request_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return match self.get_resource(request_id).await? {
                Some(existing) => Err(AppError::Conflict(format!(
                    "Cannot pledge. Current status: {}",
                    existing.status.as_str()
                ))),
                None => Err(AppError::NotFound(format!(
                    "Resource request {} not found",
                    request_id
                ))),
            };
        }

        self.get_resource(request_id).await?.ok_or_else(|| {
            AppError::NotFound(format!("Resource request {} not found", request_id))
        })
    }

    /// Progress the logistics status. Partial guards only: collection
    /// requires a fulfilled or dispatched request, delivery requires a
    /// collected one; everything else is written as-is.
    pub async fn update_resource_status(
        &self,
        request_id: &str,
        status: ResourceStatus,
    ) -> Result<ResourceRequest, AppError> {
        let existing = self.get_resource(request_id).await?.ok_or_else(|| {
            AppError::NotFound(format!("Resource request {} not found", request_id))
        })?;

        if status == ResourceStatus::Collected
            && existing.status != ResourceStatus::Fulfilled
            && existing.status != ResourceStatus::Dispatched
        {
            return Err(AppError::Conflict(
                "Item is not ready for pickup yet".to_string(),
            ));
        }
        if status == ResourceStatus::Delivered && existing.status != ResourceStatus::Collected {
            return Err(AppError::Conflict(
                "Item must be collected first".to_string(),
            ));
        }

        let now = now();
        sqlx::query("UPDATE resource_requests SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(&now)
            .bind(request_id)
            .execute(&self.pool)
            .await?;

        Ok(ResourceRequest {
            status,
            updated_at: now,
            ..existing
        })
    }

    /// Approve a restock request: deduct each line from inventory by
    /// case-insensitive name match inside one transaction, then dispatch.
    /// Deduction is lenient: missing lines no-op and stock never goes
    /// below zero.
    pub async fn approve_resource(&self, request_id: &str) -> Result<ResourceRequest, AppError> {
        let existing = self.get_resource(request_id).await?.ok_or_else(|| {
            AppError::NotFound(format!("Resource request {} not found", request_id))
        })?;

        if existing.status != ResourceStatus::Pending {
            return Err(AppError::Conflict(format!(
                "Cannot approve. Current status: {}",
                existing.status.as_str()
            )));
        }

        let mut tx = self.pool.begin().await?;
        let now = now();

        for item in &existing.items {
            let requested = parse_quantity(&item.quantity);
            sqlx::query(
                "UPDATE inventory_items SET quantity = MAX(quantity - ?, 0), updated_at = ? WHERE name_key = ?"
            )
            .bind(requested)
            .bind(&now)
            .bind(name_key(&item.item_category))
            .execute(&mut *tx)
            .await?;
        }

        // Re-check the status inside the transaction so a concurrent
        // reject/approve cannot double-process the same request.
        let result = sqlx::query(
            "UPDATE resource_requests SET status = 'dispatched', updated_at = ? WHERE id = ? AND status = 'pending'"
        )
        .bind(&now)
        .bind(request_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(AppError::Conflict(
                "Request was modified concurrently".to_string(),
            ));
        }

        tx.commit().await?;

        Ok(ResourceRequest {
            status: ResourceStatus::Dispatched,
            updated_at: now,
            ..existing
        })
    }

    /// Decline a pending request. Terminal; no inventory effect.
    pub async fn reject_resource(&self, request_id: &str) -> Result<ResourceRequest, AppError> {
        let result = sqlx::query(
            "UPDATE resource_requests SET status = 'rejected', updated_at = ? WHERE id = ? AND status = 'pending'"
        )
        .bind(now())
        .bind(request_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return match self.get_resource(request_id).await? {
                Some(existing) => Err(AppError::Conflict(format!(
                    "Cannot reject. Current status: {}",
                    existing.status.as_str()
                ))),
                None => Err(AppError::NotFound(format!(
                    "Resource request {} not found",
                    request_id
                ))),
            };
        }

        self.get_resource(request_id).await?.ok_or_else(|| {
            AppError::NotFound(format!("Resource request {} not found", request_id))
        })
    }

    /// Confirm physical receipt of a fulfilled donation: find or create a
    /// matching inventory line per item and add the donated quantity, then
    /// mark the donation delivered. One transaction end to end.
    pub async fn absorb_donation(&self, request_id: &str) -> Result<ResourceRequest, AppError> {
        let existing = self.get_resource(request_id).await?.ok_or_else(|| {
            AppError::NotFound(format!("Resource request {} not found", request_id))
        })?;

        if existing.status != ResourceStatus::Fulfilled {
            return Err(AppError::Conflict(format!(
                "Cannot absorb. Current status: {}",
                existing.status.as_str()
            )));
        }

        let mut tx = self.pool.begin().await?;
        let now = now();

        for item in &existing.items {
            let donated = parse_quantity(&item.quantity);
            let key = name_key(&item.item_category);

            let updated = sqlx::query(
                "UPDATE inventory_items SET quantity = quantity + ?, updated_at = ? WHERE name_key = ?"
            )
            .bind(donated)
            .bind(&now)
            .bind(&key)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                sqlx::query(
                    "INSERT INTO inventory_items (id, item_name, name_key, category, quantity, unit, created_at, updated_at) VALUES (?, ?, ?, 'Other', ?, 'units', ?, ?)"
                )
                .bind(new_id())
                .bind(item.item_category.trim())
                .bind(&key)
                .bind(donated)
                .bind(&now)
                .bind(&now)
                .execute(&mut *tx)
                .await?;
            }
        }

        let result = sqlx::query(
            "UPDATE resource_requests SET status = 'delivered', updated_at = ? WHERE id = ? AND status = 'fulfilled'"
        )
        .bind(&now)
        .bind(request_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(AppError::Conflict(
                "Donation was modified concurrently".to_string(),
            ));
        }

        tx.commit().await?;

        Ok(ResourceRequest {
            status: ResourceStatus::Delivered,
            updated_at: now,
            ..existing
        })
    }

    /// Attach requester/donor summaries for display.
    async fn enrich_resources(
        &self,
        requests: Vec<ResourceRequest>,
    ) -> Result<Vec<ResourceView>, AppError> {
        let mut ids: Vec<String> = requests.iter().map(|r| r.user_id.clone()).collect();
        ids.extend(requests.iter().filter_map(|r| r.donor_id.clone()));
        let summaries = self.user_summaries(&ids).await?;

        Ok(requests
            .into_iter()
            .map(|request| {
                let requester = summaries.get(&request.user_id).cloned();
                let donor = request
                    .donor_id
                    .as_ref()
                    .and_then(|d| summaries.get(d).cloned());
                ResourceView {
                    request,
                    requester,
                    donor,
                }
            })
            .collect())
    }

    // ==================== INVENTORY OPERATIONS ====================

    /// List all inventory items, newest first. Status is derived from the
    /// stored quantity on every read.
    pub async fn list_inventory(&self) -> Result<Vec<InventoryItem>, AppError> {
        let rows = sqlx::query(
            "SELECT id, item_name, category, quantity, unit, created_at, updated_at FROM inventory_items ORDER BY created_at DESC"
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(inventory_from_row).collect())
    }

    /// Get an inventory item by ID.
    pub async fn get_inventory_item(&self, id: &str) -> Result<Option<InventoryItem>, AppError> {
        let row = sqlx::query(
            "SELECT id, item_name, category, quantity, unit, created_at, updated_at FROM inventory_items WHERE id = ?"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(inventory_from_row))
    }

    /// Get an inventory item by normalized name.
    pub async fn get_inventory_item_by_name(
        &self,
        item_name: &str,
    ) -> Result<Option<InventoryItem>, AppError> {
        let row = sqlx::query(
            "SELECT id, item_name, category, quantity, unit, created_at, updated_at FROM inventory_items WHERE name_key = ?"
        )
        .bind(name_key(item_name))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(inventory_from_row))
    }

    /// Create a new stock line. Names merge case-insensitively, so a
    /// duplicate (normalized) name is a conflict rather than a second line.
    pub async fn add_inventory_item(
        &self,
        item_name: &str,
        category: ItemCategory,
        quantity: i64,
        unit: &str,
    ) -> Result<InventoryItem, AppError> {
        let key = name_key(item_name);
        let existing = sqlx::query("SELECT id FROM inventory_items WHERE name_key = ?")
            .bind(&key)
            .fetch_optional(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(AppError::Conflict(format!(
                "Item '{}' already exists in inventory",
                item_name.trim()
            )));
        }

        let id = new_id();
        let now = now();

        sqlx::query(
            "INSERT INTO inventory_items (id, item_name, name_key, category, quantity, unit, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(&id)
        .bind(item_name.trim())
        .bind(&key)
        .bind(category.as_str())
        .bind(quantity)
        .bind(unit)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(InventoryItem {
            id,
            item_name: item_name.trim().to_string(),
            category,
            quantity,
            unit: unit.to_string(),
            status: StockStatus::for_quantity(quantity),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Overwrite an item's quantity.
    pub async fn set_inventory_quantity(
        &self,
        id: &str,
        quantity: i64,
    ) -> Result<InventoryItem, AppError> {
        let result = sqlx::query(
            "UPDATE inventory_items SET quantity = ?, updated_at = ? WHERE id = ?",
        )
        .bind(quantity)
        .bind(now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Item {} not found", id)));
        }

        self.get_inventory_item(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Item {} not found", id)))
    }

    /// Adjust an item's quantity by a delta, clamped at zero. The arithmetic
    /// happens in the store so concurrent adjustments do not lose updates.
    pub async fn adjust_inventory_quantity(
        &self,
        id: &str,
        delta: i64,
    ) -> Result<InventoryItem, AppError> {
        let result = sqlx::query(
            "UPDATE inventory_items SET quantity = MAX(quantity + ?, 0), updated_at = ? WHERE id = ?"
        )
        .bind(delta)
        .bind(now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Item {} not found", id)));
        }

        self.get_inventory_item(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Item {} not found", id)))
    }

    /// Hard delete. Reports success even when the item is already gone.
    pub async fn remove_inventory_item(&self, id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM inventory_items WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // ==================== CONTACT MESSAGE OPERATIONS ====================

    /// Store an inbound inquiry with status new.
    pub async fn create_contact_message(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        subject: &str,
        message: &str,
    ) -> Result<ContactMessage, AppError> {
        let id = new_id();
        let now = now();

        sqlx::query(
            "INSERT INTO contact_messages (id, first_name, last_name, email, subject, message, status, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, 'new', ?, ?)"
        )
        .bind(&id)
        .bind(first_name)
        .bind(last_name)
        .bind(email)
        .bind(subject)
        .bind(message)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(ContactMessage {
            id,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            subject: subject.to_string(),
            message: message.to_string(),
            status: ContactStatus::New,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// List all contact messages, newest first.
    pub async fn list_contact_messages(&self) -> Result<Vec<ContactMessage>, AppError> {
        let rows = sqlx::query(
            "SELECT id, first_name, last_name, email, subject, message, status, created_at, updated_at FROM contact_messages ORDER BY created_at DESC"
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(contact_from_row).collect())
    }

    /// Update a message's triage status.
    pub async fn update_contact_status(
        &self,
        id: &str,
        status: ContactStatus,
    ) -> Result<ContactMessage, AppError> {
        let result =
            sqlx::query("UPDATE contact_messages SET status = ?, updated_at = ? WHERE id = ?")
                .bind(status.as_str())
                .bind(now())
                .bind(id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Message {} not found", id)));
        }

        let row = sqlx::query(
            "SELECT id, first_name, last_name, email, subject, message, status, created_at, updated_at FROM contact_messages WHERE id = ?"
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(contact_from_row(&row))
    }

    // ==================== NOTIFICATION LOG ====================

    /// Record a delivered notification. Called from the dispatch worker only.
    pub async fn record_notification(
        &self,
        kind: &str,
        recipient_id: Option<&str>,
        subject: &str,
        body: &str,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO notifications (id, kind, recipient_id, subject, body, created_at) VALUES (?, ?, ?, ?, ?, ?)"
        )
        .bind(new_id())
        .bind(kind)
        .bind(recipient_id)
        .bind(subject)
        .bind(body)
        .bind(now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// Helper functions for row conversion

fn user_from_row(row: &sqlx::sqlite::SqliteRow) -> User {
    let role: String = row.get("role");
    User {
        id: row.get("id"),
        full_name: row.get("full_name"),
        email: row.get("email"),
        phone: row.get("phone"),
        role: Role::parse(&role).unwrap_or(Role::Victim),
        location: GeoPoint::new(row.get("location_lng"), row.get("location_lat")),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn sos_from_row(row: &sqlx::sqlite::SqliteRow) -> SosRequest {
    let status: String = row.get("status");
    let items_json: String = row.get("required_items");
    let accuracy: Option<f64> = row.get("location_accuracy");
    let mut location = GeoPoint::new(row.get("location_lng"), row.get("location_lat"));
    location.accuracy = accuracy;

    SosRequest {
        id: row.get("id"),
        user_id: row.get("user_id"),
        sos_type: row.get("type"),
        description: row.get("description"),
        image: row.get("image"),
        required_items: serde_json::from_str(&items_json).unwrap_or_default(),
        location,
        status: SosStatus::parse(&status).unwrap_or(SosStatus::Pending),
        assigned_volunteer: row.get("assigned_volunteer"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn resource_from_row(row: &sqlx::sqlite::SqliteRow) -> ResourceRequest {
    let status: String = row.get("status");
    let kind: String = row.get("kind");
    let urgency: String = row.get("urgency");
    let items_json: String = row.get("items");

    ResourceRequest {
        id: row.get("id"),
        user_id: row.get("user_id"),
        sos_id: row.get("sos_id"),
        kind: RequestKind::parse(&kind).unwrap_or(RequestKind::Need),
        items: serde_json::from_str(&items_json).unwrap_or_default(),
        donor_id: row.get("donor_id"),
        urgency: Urgency::parse(&urgency).unwrap_or(Urgency::Medium),
        notes: row.get("notes"),
        status: ResourceStatus::parse(&status).unwrap_or(ResourceStatus::Pending),
        location: GeoPoint::new(row.get("location_lng"), row.get("location_lat")),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn inventory_from_row(row: &sqlx::sqlite::SqliteRow) -> InventoryItem {
    let category: String = row.get("category");
    let quantity: i64 = row.get("quantity");

    InventoryItem {
        id: row.get("id"),
        item_name: row.get("item_name"),
        category: ItemCategory::parse(&category).unwrap_or(ItemCategory::Other),
        quantity,
        unit: row.get("unit"),
        status: StockStatus::for_quantity(quantity),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn contact_from_row(row: &sqlx::sqlite::SqliteRow) -> ContactMessage {
    let status: String = row.get("status");
    ContactMessage {
        id: row.get("id"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        email: row.get("email"),
        subject: row.get("subject"),
        message: row.get("message"),
        status: ContactStatus::parse(&status).unwrap_or(ContactStatus::New),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
