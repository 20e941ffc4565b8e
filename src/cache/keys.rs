//! Cache key prefix registry
//!
//! Every key used by application code starts with [`CACHE_PREFIX`] so that
//! [`TieredCache::clear_all`](super::TieredCache::clear_all) can tell cache
//! entries apart from other durable data such as auth tokens.

/// Universal prefix shared by every cache key.
pub const CACHE_PREFIX: &str = "cache_";

pub const STUDENT_CLASSES: &str = "cache_student_classes_";
pub const CLASS_DETAILS: &str = "cache_class_details_";
pub const TEST_DETAILS: &str = "cache_test_details_";
pub const TEACHERS: &str = "cache_teachers_";
pub const NOTIFICATIONS: &str = "cache_notifications_";
pub const SUBSCRIPTION: &str = "cache_subscription_";
pub const USER_PROFILE: &str = "cache_user_profile_";

/// All resource family prefixes.
pub const ALL_PREFIXES: [&str; 7] = [
    STUDENT_CLASSES,
    CLASS_DETAILS,
    TEST_DETAILS,
    TEACHERS,
    NOTIFICATIONS,
    SUBSCRIPTION,
    USER_PROFILE,
];

/// Classes of one student.
pub fn student_classes(student_id: &str) -> String {
    format!("{STUDENT_CLASSES}{student_id}")
}

/// Details of one class.
pub fn class_details(class_id: &str) -> String {
    format!("{CLASS_DETAILS}{class_id}")
}

/// Details of one test.
pub fn test_details(test_id: &str) -> String {
    format!("{TEST_DETAILS}{test_id}")
}

/// Teachers of one class.
pub fn teachers(class_id: &str) -> String {
    format!("{TEACHERS}{class_id}")
}

/// Notifications of one user.
pub fn notifications(user_id: &str) -> String {
    format!("{NOTIFICATIONS}{user_id}")
}

/// Subscription state of one user.
pub fn subscription(user_id: &str) -> String {
    format!("{SUBSCRIPTION}{user_id}")
}

/// Profile of one user.
pub fn user_profile(user_id: &str) -> String {
    format!("{USER_PROFILE}{user_id}")
}

/// Returns true if the key belongs to the cache namespace.
pub fn is_cache_key(key: &str) -> bool {
    key.starts_with(CACHE_PREFIX)
}
