//! Core records mirrored from backend JSON
//!
//! The backend is loose about types: ids arrive as numbers or strings,
//! amounts as strings, flags as `"yes"`/`"no"`. The `lenient` helpers
//! absorb that at deserialization time so the rest of the crate sees
//! plain Rust types.

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{NaamError, Result};

// ============================================================================
// Users and sessions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserRole {
    #[serde(rename = "farmer")]
    Farmer,
    #[serde(rename = "investor")]
    Investor,
    #[serde(rename = "serviceProvider", alias = "service_provider")]
    ServiceProvider,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Farmer => "farmer",
            UserRole::Investor => "investor",
            UserRole::ServiceProvider => "serviceProvider",
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['_', '-'], "").as_str() {
            "farmer" => Ok(UserRole::Farmer),
            "investor" => Ok(UserRole::Investor),
            "serviceprovider" => Ok(UserRole::ServiceProvider),
            _ => Err(format!(
                "Unknown role '{}'. Valid roles: farmer, investor, serviceProvider",
                s
            )),
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user's profile as the client understands it
///
/// Every field is optional; the server fills in what it has.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub id: Option<String>,
    pub name: Option<String>,
    pub mobile: Option<String>,
    pub email: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<String>,
    pub address: Option<String>,
    pub village: Option<String>,
    pub pincode: Option<String>,
    pub aadhaar_number: Option<String>,
    pub pan_number: Option<String>,
    pub aadhaar_verified: Option<bool>,
    pub pan_verified: Option<bool>,
    pub profile_image: Option<String>,
    pub role: Option<UserRole>,
    /// Percentage supplied by the server, if any
    pub profile_completion: Option<f64>,
}

impl UserProfile {
    /// Map raw server JSON into a profile
    ///
    /// Accepts the profile object itself or one wrapped in `data`, `user`
    /// or `farmer`. Keys may be camelCase or snake_case, and a few legacy
    /// spellings (`fullName`, `phone`, `pinCode`) are recognised.
    pub fn from_server_payload(payload: &Value) -> Self {
        let obj = unwrap_profile_object(payload);

        let role = pick_str(obj, &["role", "userRole", "user_role"]).and_then(|r| r.parse().ok());

        Self {
            id: pick_str(obj, &["id", "_id", "userId", "user_id", "farmerId", "farmer_id"]),
            name: pick_str(obj, &["name", "fullName", "full_name"]),
            mobile: pick_str(obj, &["mobile", "mobileNumber", "mobile_number", "phone"]),
            email: pick_str(obj, &["email"]),
            gender: pick_str(obj, &["gender"]),
            date_of_birth: pick_str(obj, &["dateOfBirth", "date_of_birth", "dob"]),
            address: pick_str(obj, &["address"]),
            village: pick_str(obj, &["village", "villageName", "village_name"]),
            pincode: pick_str(obj, &["pincode", "pinCode", "pin_code"]),
            aadhaar_number: pick_str(obj, &["aadhaarNumber", "aadhaar_number", "aadhaar"]),
            pan_number: pick_str(obj, &["panNumber", "pan_number", "pan"]),
            aadhaar_verified: pick_bool(obj, &["aadhaarVerified", "aadhaar_verified"]),
            pan_verified: pick_bool(obj, &["panVerified", "pan_verified"]),
            profile_image: pick_str(
                obj,
                &["profileImage", "profile_image", "profileImageUrl", "avatar"],
            ),
            role,
            profile_completion: pick_f64(
                obj,
                &["profileCompletion", "profile_completion", "completionPercentage"],
            ),
        }
    }

    /// Overlay the non-empty fields of `patch` onto this profile
    pub fn merge(&mut self, patch: &UserProfile) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if patch.$field.is_some() { self.$field = patch.$field.clone(); })*
            };
        }
        take!(
            id,
            name,
            mobile,
            email,
            gender,
            date_of_birth,
            address,
            village,
            pincode,
            aadhaar_number,
            pan_number,
            aadhaar_verified,
            pan_verified,
            profile_image,
            role,
            profile_completion
        );
    }
}

fn unwrap_profile_object(payload: &Value) -> &serde_json::Map<String, Value> {
    static EMPTY: std::sync::OnceLock<serde_json::Map<String, Value>> = std::sync::OnceLock::new();

    let mut current = payload;
    for _ in 0..3 {
        let next = ["data", "user", "farmer", "profile"]
            .iter()
            .find_map(|key| current.get(key).filter(|v| v.is_object()));
        match next {
            Some(inner) => current = inner,
            None => break,
        }
    }
    current
        .as_object()
        .unwrap_or_else(|| EMPTY.get_or_init(serde_json::Map::new))
}

fn pick<'a>(obj: &'a serde_json::Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| !v.is_null())
}

fn pick_str(obj: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<String> {
    match pick(obj, keys)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn pick_bool(obj: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<bool> {
    match pick(obj, keys)? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        Value::String(s) => lenient::parse_flag(s),
        _ => None,
    }
}

fn pick_f64(obj: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<f64> {
    match pick(obj, keys)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').parse().ok(),
        _ => None,
    }
}

// ============================================================================
// Land and bank details
// ============================================================================

/// One parcel of land registered by a farmer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LandDetails {
    #[serde(deserialize_with = "lenient::opt_string")]
    pub id: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub farmer_id: Option<String>,
    pub ownership_type: Option<String>,
    pub irrigation_type: Option<String>,
    pub soil_type: Option<String>,
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub land_area: Option<f64>,
    pub survey_number: Option<String>,
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub latitude: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub longitude: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub state_id: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub district_id: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub taluk_id: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub village_id: Option<String>,
    #[serde(
        serialize_with = "lenient::ser_yes_no",
        deserialize_with = "lenient::yes_no"
    )]
    pub coconut_farming: bool,
    #[serde(deserialize_with = "lenient::opt_u32")]
    pub number_of_trees: Option<u32>,
    #[serde(deserialize_with = "lenient::opt_u32")]
    pub tree_age_years: Option<u32>,
    pub coconut_variety: Option<String>,
    pub harvest_frequency: Option<String>,
}

impl LandDetails {
    /// Text parts of the multipart land-details form
    ///
    /// Coconut sub-fields are only included when the farmer grows coconut.
    /// Empty optional fields are left out.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::new();
        let mut push = |name: &'static str, value: Option<String>| {
            if let Some(v) = value.filter(|v| !v.is_empty()) {
                fields.push((name, v));
            }
        };

        push("ownershipType", self.ownership_type.clone());
        push("irrigationType", self.irrigation_type.clone());
        push("soilType", self.soil_type.clone());
        push("landArea", self.land_area.map(|v| v.to_string()));
        push("surveyNumber", self.survey_number.clone());
        push("latitude", self.latitude.map(|v| v.to_string()));
        push("longitude", self.longitude.map(|v| v.to_string()));
        push("stateId", self.state_id.clone());
        push("districtId", self.district_id.clone());
        push("talukId", self.taluk_id.clone());
        push("villageId", self.village_id.clone());
        push(
            "coconutFarming",
            Some(if self.coconut_farming { "yes" } else { "no" }.to_string()),
        );

        if self.coconut_farming {
            push("numberOfTrees", self.number_of_trees.map(|v| v.to_string()));
            push("treeAgeYears", self.tree_age_years.map(|v| v.to_string()));
            push("coconutVariety", self.coconut_variety.clone());
            push("harvestFrequency", self.harvest_frequency.clone());
        }

        fields
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BankDetails {
    pub account_holder_name: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub account_number: Option<String>,
    pub ifsc_code: Option<String>,
    pub bank_name: Option<String>,
    pub branch_name: Option<String>,
}

// ============================================================================
// Collections and payments
// ============================================================================

/// Settlement state of a collection or payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(into = "String")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Other(String),
}

impl From<String> for PaymentStatus {
    fn from(s: String) -> Self {
        match s.trim().to_lowercase().as_str() {
            "pending" | "processing" | "unpaid" => PaymentStatus::Pending,
            "paid" | "completed" | "settled" => PaymentStatus::Paid,
            _ => PaymentStatus::Other(s),
        }
    }
}

/// A missing or null status is `Pending`
impl<'de> Deserialize<'de> for PaymentStatus {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        Ok(lenient::opt_string(d)?
            .map(PaymentStatus::from)
            .unwrap_or_default())
    }
}

impl From<PaymentStatus> for String {
    fn from(status: PaymentStatus) -> Self {
        match status {
            PaymentStatus::Pending => "pending".to_string(),
            PaymentStatus::Paid => "paid".to_string(),
            PaymentStatus::Other(s) => s,
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => f.write_str("pending"),
            PaymentStatus::Paid => f.write_str("paid"),
            PaymentStatus::Other(s) => f.write_str(s),
        }
    }
}

/// Bank transfer rail used to settle a payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMode {
    #[serde(alias = "neft")]
    Neft,
    #[serde(alias = "rtgs")]
    Rtgs,
}

impl std::fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMode::Neft => f.write_str("NEFT"),
            PaymentMode::Rtgs => f.write_str("RTGS"),
        }
    }
}

/// A recorded coconut delivery
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CollectionEntry {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub farmer_id: Option<String>,
    pub farmer_name: Option<String>,
    #[serde(deserialize_with = "lenient::opt_date")]
    pub collected_on: Option<NaiveDate>,
    #[serde(deserialize_with = "lenient::opt_u32")]
    pub quantity: Option<u32>,
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub weight_kg: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub rate: Option<f64>,
    #[serde(deserialize_with = "lenient::f64_or_zero")]
    pub amount: f64,
    pub status: PaymentStatus,
}

/// Body of a new collection entry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCollectionEntry {
    pub farmer_id: String,
    pub collected_on: NaiveDate,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
    /// Price per nut
    pub rate: f64,
}

impl NewCollectionEntry {
    pub fn amount(&self) -> f64 {
        self.quantity as f64 * self.rate
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Payment {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub collection_id: Option<String>,
    #[serde(deserialize_with = "lenient::f64_or_zero")]
    pub amount: f64,
    pub mode: Option<PaymentMode>,
    pub status: PaymentStatus,
    pub reference: Option<String>,
    #[serde(deserialize_with = "lenient::opt_date")]
    pub paid_on: Option<NaiveDate>,
}

/// Farmer summary as listed for an investor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FarmerSummary {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    pub name: Option<String>,
    pub mobile: Option<String>,
    pub village: Option<String>,
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub land_area: Option<f64>,
}

// ============================================================================
// Market prices
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePoint {
    #[serde(deserialize_with = "lenient::date")]
    pub date: NaiveDate,
    #[serde(default, deserialize_with = "lenient::string")]
    pub commodity: String,
    #[serde(default)]
    pub market: Option<String>,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub min_price: f64,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub max_price: f64,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub modal_price: f64,
}

// ============================================================================
// Feed: news, ads, quotes, polls
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Engagement {
    #[serde(deserialize_with = "lenient::u64_or_zero")]
    pub likes: u64,
    #[serde(deserialize_with = "lenient::u64_or_zero")]
    pub shares: u64,
    #[serde(deserialize_with = "lenient::u64_or_zero")]
    pub views: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewsItem {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub title: String,
    pub body: Option<String>,
    pub image_url: Option<String>,
    pub published_at: Option<String>,
    #[serde(flatten)]
    pub engagement: Engagement,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Advertisement {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub title: String,
    pub image_url: Option<String>,
    pub link_url: Option<String>,
    #[serde(flatten)]
    pub engagement: Engagement,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Quote {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub text: String,
    pub author: Option<String>,
    #[serde(flatten)]
    pub engagement: Engagement,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PollOption {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub label: String,
    #[serde(deserialize_with = "lenient::u64_or_zero")]
    pub votes: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Poll {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub question: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub options: Vec<PollOption>,
    #[serde(deserialize_with = "lenient::or_default")]
    pub has_voted: bool,
}

impl Poll {
    pub fn total_votes(&self) -> u64 {
        self.options.iter().map(|o| o.votes).sum()
    }
}

/// Kind of feed item that carries engagement counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    News,
    Ads,
    Quotes,
}

impl FeedKind {
    pub fn path_segment(&self) -> &'static str {
        match self {
            FeedKind::News => "news",
            FeedKind::Ads => "ads",
            FeedKind::Quotes => "quotes",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngagementAction {
    Like,
    Share,
    View,
}

// ============================================================================
// Reference geography
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationLevel {
    State,
    District,
    Taluk,
    Village,
}

impl std::fmt::Display for LocationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LocationLevel::State => "state",
            LocationLevel::District => "district",
            LocationLevel::Taluk => "taluk",
            LocationLevel::Village => "village",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    #[serde(deserialize_with = "lenient::string", alias = "_id")]
    pub id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub name: String,
}

// ============================================================================
// Attachment Types
// ============================================================================

/// MIME types accepted by the upload endpoints
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum UploadMimeType {
    Jpeg,
    Png,
    WebP,
    Pdf,
}

impl UploadMimeType {
    /// Detect MIME type from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::WebP),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::WebP => "image/webp",
            Self::Pdf => "application/pdf",
        }
    }

    pub fn is_image(&self) -> bool {
        !matches!(self, Self::Pdf)
    }
}

impl std::fmt::Display for UploadMimeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Largest file the backend accepts in one part
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// A file queued for a multipart upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    /// Unique identifier for the attachment (UUID v4)
    pub id: String,
    /// Multipart field name, e.g. `landDocuments` or `geoTaggedPhotos`
    pub field: String,
    pub file_path: String,
    pub file_name: String,
    pub mime_type: UploadMimeType,
    pub file_size: u64,
    /// SHA-256 of the content, hex encoded
    pub file_hash: String,
}

impl Attachment {
    /// Inspect a file on disk and build an attachment for `field`
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for unreadable files, unsupported extensions
    /// and files above `MAX_UPLOAD_BYTES`.
    pub fn from_path(field: &str, path: &Path) -> Result<Self> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        let mime_type = UploadMimeType::from_extension(ext).ok_or_else(|| {
            NaamError::InvalidInput(format!(
                "Unsupported file type for '{}'. Use jpg, png, webp or pdf.",
                path.display()
            ))
        })?;

        let unreadable =
            |e: std::io::Error| NaamError::InvalidInput(format!("Cannot read '{}': {}", path.display(), e));

        // Checked before reading so an oversized file is never loaded
        let on_disk = std::fs::metadata(path).map_err(unreadable)?.len();
        if on_disk > MAX_UPLOAD_BYTES {
            return Err(too_large(path, on_disk));
        }
        let bytes = std::fs::read(path).map_err(unreadable)?;
        let file_size = bytes.len() as u64;
        if file_size > MAX_UPLOAD_BYTES {
            return Err(too_large(path, file_size));
        }

        let file_hash = format!("{:x}", Sha256::digest(&bytes));
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| format!("upload.{}", ext));

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            field: field.to_string(),
            file_path: path.to_string_lossy().to_string(),
            file_name,
            mime_type,
            file_size,
            file_hash,
        })
    }
}

fn too_large(path: &Path, size: u64) -> NaamError {
    NaamError::InvalidInput(format!(
        "'{}' is {} bytes; the limit is {} bytes",
        path.display(),
        size,
        MAX_UPLOAD_BYTES
    ))
}

// ============================================================================
// Lenient deserializers
// ============================================================================

pub(crate) mod lenient {
    use chrono::NaiveDate;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn parse_flag(s: &str) -> Option<bool> {
        match s.trim().to_lowercase().as_str() {
            "yes" | "y" | "true" | "1" => Some(true),
            "no" | "n" | "false" | "0" | "" => Some(false),
            _ => None,
        }
    }

    fn parse_date(s: &str) -> Option<NaiveDate> {
        let head = s.trim().get(..10)?;
        NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
    }

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(opt_string(d)?.unwrap_or_default())
    }

    pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        match Option::<Value>::deserialize(d)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(other) => Err(D::Error::custom(format!("expected string or number, got {}", other))),
        }
    }

    pub fn opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        match Option::<Value>::deserialize(d)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => Ok(n.as_f64()),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => s
                .trim()
                .replace(',', "")
                .parse()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("invalid number '{}'", s))),
            Some(other) => Err(D::Error::custom(format!("expected number, got {}", other))),
        }
    }

    pub fn f64_or_zero<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        Ok(opt_f64(d)?.unwrap_or(0.0))
    }

    pub fn opt_u32<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
        Ok(opt_f64(d)?.filter(|v| *v >= 0.0).map(|v| v.round() as u32))
    }

    /// `null` reads as the type's default
    pub fn or_default<'de, D, T>(d: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Default,
    {
        Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
    }

    pub fn u64_or_zero<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
        Ok(opt_f64(d)?.filter(|v| *v >= 0.0).map(|v| v.round() as u64).unwrap_or(0))
    }

    pub fn yes_no<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        match Option::<Value>::deserialize(d)? {
            None | Some(Value::Null) => Ok(false),
            Some(Value::Bool(b)) => Ok(b),
            Some(Value::Number(n)) => Ok(n.as_i64().unwrap_or(0) != 0),
            Some(Value::String(s)) => {
                parse_flag(&s).ok_or_else(|| D::Error::custom(format!("invalid flag '{}'", s)))
            }
            Some(other) => Err(D::Error::custom(format!("expected yes/no, got {}", other))),
        }
    }

    pub fn ser_yes_no<S: Serializer>(value: &bool, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(if *value { "yes" } else { "no" })
    }

    pub fn opt_date<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        match Option::<String>::deserialize(d)? {
            None => Ok(None),
            Some(s) if s.trim().is_empty() => Ok(None),
            Some(s) => parse_date(&s)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid date '{}'", s))),
        }
    }

    pub fn date<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        let s = String::deserialize(d)?;
        parse_date(&s).ok_or_else(|| D::Error::custom(format!("invalid date '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_role_wire_names() {
        assert_eq!(serde_json::to_string(&UserRole::ServiceProvider).unwrap(), r#""serviceProvider""#);
        let role: UserRole = serde_json::from_str(r#""service_provider""#).unwrap();
        assert_eq!(role, UserRole::ServiceProvider);
        assert_eq!("Farmer".parse::<UserRole>().unwrap(), UserRole::Farmer);
        assert_eq!("service-provider".parse::<UserRole>().unwrap(), UserRole::ServiceProvider);
        assert!("admin".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_profile_from_wrapped_snake_case_payload() {
        let payload = json!({
            "status": "success",
            "data": {
                "user": {
                    "id": 42,
                    "full_name": "Lakshmi",
                    "mobile_number": "9876543210",
                    "pin_code": 682001,
                    "aadhaar_verified": "yes",
                    "profile_completion": "70%",
                    "role": "farmer"
                }
            }
        });

        let profile = UserProfile::from_server_payload(&payload);
        assert_eq!(profile.id.as_deref(), Some("42"));
        assert_eq!(profile.name.as_deref(), Some("Lakshmi"));
        assert_eq!(profile.mobile.as_deref(), Some("9876543210"));
        assert_eq!(profile.pincode.as_deref(), Some("682001"));
        assert_eq!(profile.aadhaar_verified, Some(true));
        assert_eq!(profile.profile_completion, Some(70.0));
        assert_eq!(profile.role, Some(UserRole::Farmer));
    }

    #[test]
    fn test_profile_from_non_object_payload_is_empty() {
        let profile = UserProfile::from_server_payload(&json!("oops"));
        assert_eq!(profile, UserProfile::default());
    }

    #[test]
    fn test_profile_blank_strings_are_missing() {
        let profile = UserProfile::from_server_payload(&json!({"name": "  ", "email": null}));
        assert!(profile.name.is_none());
        assert!(profile.email.is_none());
    }

    #[test]
    fn test_profile_merge_keeps_untouched_fields() {
        let mut profile = UserProfile {
            name: Some("Old".to_string()),
            mobile: Some("9876543210".to_string()),
            ..Default::default()
        };
        let patch = UserProfile {
            name: Some("New".to_string()),
            ..Default::default()
        };
        profile.merge(&patch);
        assert_eq!(profile.name.as_deref(), Some("New"));
        assert_eq!(profile.mobile.as_deref(), Some("9876543210"));
    }

    #[test]
    fn test_land_details_lenient_decode() {
        let land: LandDetails = serde_json::from_value(json!({
            "id": 7,
            "landArea": "2.5",
            "latitude": 9.93,
            "coconutFarming": "yes",
            "numberOfTrees": "120",
            "stateId": 32
        }))
        .unwrap();

        assert_eq!(land.id.as_deref(), Some("7"));
        assert_eq!(land.land_area, Some(2.5));
        assert!(land.coconut_farming);
        assert_eq!(land.number_of_trees, Some(120));
        assert_eq!(land.state_id.as_deref(), Some("32"));
    }

    #[test]
    fn test_land_details_serializes_yes_no() {
        let land = LandDetails {
            coconut_farming: false,
            ..Default::default()
        };
        let value = serde_json::to_value(&land).unwrap();
        assert_eq!(value["coconutFarming"], "no");
    }

    #[test]
    fn test_land_form_fields_skip_coconut_when_not_farming() {
        let land = LandDetails {
            ownership_type: Some("owned".to_string()),
            coconut_farming: false,
            number_of_trees: Some(10),
            ..Default::default()
        };
        let fields = land.form_fields();
        assert!(fields.contains(&("ownershipType", "owned".to_string())));
        assert!(fields.contains(&("coconutFarming", "no".to_string())));
        assert!(!fields.iter().any(|(name, _)| *name == "numberOfTrees"));
    }

    #[test]
    fn test_payment_status_mapping() {
        let status: PaymentStatus = serde_json::from_str(r#""COMPLETED""#).unwrap();
        assert_eq!(status, PaymentStatus::Paid);
        let status: PaymentStatus = serde_json::from_str(r#""on_hold""#).unwrap();
        assert_eq!(status, PaymentStatus::Other("on_hold".to_string()));
        assert_eq!(serde_json::to_string(&PaymentStatus::Pending).unwrap(), r#""pending""#);
    }

    #[test]
    fn test_null_status_is_pending() {
        let entries: Vec<CollectionEntry> = serde_json::from_value(json!([
            {"id": 1, "amount": 100, "status": null},
            {"id": 2, "amount": 200}
        ]))
        .unwrap();
        assert!(entries.iter().all(|e| e.status == PaymentStatus::Pending));

        let payment: Payment = serde_json::from_value(json!({"id": 9, "status": null})).unwrap();
        assert_eq!(payment.status, PaymentStatus::Pending);
    }

    #[test]
    fn test_feed_items_tolerate_null_text() {
        let news: Vec<NewsItem> = serde_json::from_value(json!([
            {"id": "n1", "title": null, "likes": 3},
            {"id": "n2", "title": "Copra prices rise"}
        ]))
        .unwrap();
        assert_eq!(news[0].title, "");
        assert_eq!(news[0].engagement.likes, 3);
        assert_eq!(news[1].title, "Copra prices rise");

        let ad: Advertisement = serde_json::from_value(json!({"id": 1, "title": null})).unwrap();
        assert_eq!(ad.title, "");
        let quote: Quote = serde_json::from_value(json!({"id": "q1", "text": null})).unwrap();
        assert_eq!(quote.text, "");

        let poll: Poll = serde_json::from_value(json!({
            "id": "p1",
            "question": null,
            "options": [{"id": "o1", "label": null, "votes": 2}],
            "hasVoted": null
        }))
        .unwrap();
        assert_eq!(poll.question, "");
        assert_eq!(poll.options[0].label, "");
        assert!(!poll.has_voted);

        let poll: Poll = serde_json::from_value(json!({"id": "p2", "options": null})).unwrap();
        assert!(poll.options.is_empty());
    }

    #[test]
    fn test_collection_entry_decode() {
        let entry: CollectionEntry = serde_json::from_value(json!({
            "id": 101,
            "collectedOn": "2024-03-05T10:00:00.000Z",
            "quantity": 500,
            "amount": "6500.50",
            "status": "paid"
        }))
        .unwrap();

        assert_eq!(entry.id, "101");
        assert_eq!(entry.collected_on, NaiveDate::from_ymd_opt(2024, 3, 5));
        assert_eq!(entry.quantity, Some(500));
        assert_eq!(entry.amount, 6500.5);
        assert_eq!(entry.status, PaymentStatus::Paid);
    }

    #[test]
    fn test_new_collection_amount() {
        let entry = NewCollectionEntry {
            farmer_id: "f1".to_string(),
            collected_on: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            quantity: 400,
            weight_kg: None,
            rate: 12.5,
        };
        assert_eq!(entry.amount(), 5000.0);
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["collectedOn"], "2024-01-01");
        assert!(value.get("weightKg").is_none());
    }

    #[test]
    fn test_news_item_flattened_engagement() {
        let item: NewsItem = serde_json::from_value(json!({
            "id": "n1",
            "title": "Copra prices rise",
            "likes": "12",
            "views": 300
        }))
        .unwrap();
        assert_eq!(item.engagement.likes, 12);
        assert_eq!(item.engagement.shares, 0);
        assert_eq!(item.engagement.views, 300);
    }

    #[test]
    fn test_poll_total_votes() {
        let poll: Poll = serde_json::from_value(json!({
            "id": 1,
            "question": "Best harvest month?",
            "options": [
                {"id": 1, "label": "March", "votes": 4},
                {"id": 2, "label": "April", "votes": 6}
            ]
        }))
        .unwrap();
        assert_eq!(poll.total_votes(), 10);
        assert!(!poll.has_voted);
    }

    #[test]
    fn test_location_accepts_numeric_ids() {
        let loc: Location = serde_json::from_value(json!({"id": 32, "name": "Kerala"})).unwrap();
        assert_eq!(loc.id, "32");
    }

    #[test]
    fn test_upload_mime_from_extension() {
        assert_eq!(UploadMimeType::from_extension("JPG"), Some(UploadMimeType::Jpeg));
        assert_eq!(UploadMimeType::from_extension("pdf"), Some(UploadMimeType::Pdf));
        assert!(!UploadMimeType::Pdf.is_image());
        assert_eq!(UploadMimeType::from_extension("gif"), None);
    }

    #[test]
    fn test_attachment_from_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("deed.pdf");
        std::fs::write(&path, b"%PDF-1.4 test").unwrap();

        let attachment = Attachment::from_path("landDocuments", &path).unwrap();
        assert_eq!(attachment.field, "landDocuments");
        assert_eq!(attachment.file_name, "deed.pdf");
        assert_eq!(attachment.mime_type, UploadMimeType::Pdf);
        assert_eq!(attachment.file_size, 13);
        assert_eq!(attachment.file_hash.len(), 64);
    }

    #[test]
    fn test_attachment_rejects_unknown_extension() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();

        let err = Attachment::from_path("landDocuments", &path).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_attachment_rejects_file_over_limit() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("scan.jpg");
        let file = std::fs::File::create(&path).unwrap();
        file.set_len(MAX_UPLOAD_BYTES + 1).unwrap();

        let err = Attachment::from_path("geoTaggedPhotos", &path).unwrap_err();
        assert!(matches!(err, NaamError::InvalidInput(_)));
        assert!(err.to_string().contains("the limit is 10485760 bytes"));
    }

    #[test]
    fn test_attachment_at_limit_is_accepted() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("scan.png");
        let file = std::fs::File::create(&path).unwrap();
        file.set_len(MAX_UPLOAD_BYTES).unwrap();

        let attachment = Attachment::from_path("geoTaggedPhotos", &path).unwrap();
        assert_eq!(attachment.file_size, MAX_UPLOAD_BYTES);
    }

    #[test]
    fn test_attachment_missing_file() {
        let err = Attachment::from_path("landDocuments", Path::new("/nonexistent/deed.pdf")).unwrap_err();
        assert!(err.to_string().contains("Cannot read"));
    }
}
