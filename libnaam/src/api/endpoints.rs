//! Endpoint paths, relative to `{base_url}/api/{version}`

use crate::types::FeedKind;

pub const SEND_OTP: &str = "/auth/send-otp";
pub const VERIFY_OTP: &str = "/auth/verify-otp";
pub const LOGOUT: &str = "/auth/logout";

pub const PROFILE: &str = "/users/profile";
pub const PROFILE_IMAGES: &str = "/users/profile/images";
pub const KYC: &str = "/users/kyc";
pub const BANK_DETAILS: &str = "/users/bank-details";

pub const STATES: &str = "/locations/states";

pub const COLLECTIONS: &str = "/collections";
pub const PAYMENTS: &str = "/payments";
pub const PRICE_HISTORY: &str = "/prices/history";

pub const NEWS: &str = "/news";
pub const ADS: &str = "/ads";
pub const DAILY_QUOTE: &str = "/quotes/today";
pub const ACTIVE_POLLS: &str = "/polls/active";

pub fn farmer_land_details(farmer_id: &str) -> String {
    format!("/farmers/{}/land-details", farmer_id)
}

pub fn land_details(land_id: &str) -> String {
    format!("/land-details/{}", land_id)
}

pub fn districts(state_id: &str) -> String {
    format!("/locations/states/{}/districts", state_id)
}

pub fn taluks(district_id: &str) -> String {
    format!("/locations/districts/{}/taluks", district_id)
}

pub fn villages(taluk_id: &str) -> String {
    format!("/locations/taluks/{}/villages", taluk_id)
}

pub fn collection(id: &str) -> String {
    format!("/collections/{}", id)
}

pub fn investor_farmers(investor_id: &str) -> String {
    format!("/investors/{}/farmers", investor_id)
}

pub fn poll_vote(poll_id: &str) -> String {
    format!("/polls/{}/vote", poll_id)
}

pub fn engagement(kind: FeedKind, id: &str) -> String {
    format!("/{}/{}/engagement", kind.path_segment(), id)
}
