//! User-visible messages.

pub const SIGNUP_CHECK_EMAIL: &str =
  "נשלח אליך מייל לאימות החשבון. אנא בדוק את תיבת הדואר שלך.";
pub const SIGNUP_FAILED: &str = "אירעה שגיאה בהרשמה. נסו שנית מאוחר יותר.";
pub const LOGIN_FAILED: &str = "אירעה שגיאה בהתחברות. נסו שנית מאוחר יותר.";

pub const SOURCES_LOAD_FAILED: &str = "אירעה שגיאה בטעינת המקורות. אנא נסו שנית מאוחר יותר.";
pub const SOURCE_LOAD_FAILED: &str = "אירעה שגיאה בטעינת הנתונים. אנא נסו שנית מאוחר יותר.";
pub const SOURCE_NOT_FOUND: &str = "המקור המבוקש לא נמצא.";
pub const NEW_SOURCE_FAILED: &str = "אירעה שגיאה בהוספת המקור. אנא נסו שוב.";

pub const INSIGHTS_LOAD_FAILED: &str = "אירעה שגיאה בטעינת החידושים. אנא נסו שנית מאוחר יותר.";
pub const INSIGHT_SUBMIT_FAILED: &str = "אירעה שגיאה בפרסום החידוש. אנא נסו שנית מאוחר יותר.";
pub const LIKE_FAILED: &str = "אירעה שגיאה בעדכון הלייק. אנא נסו שנית מאוחר יותר.";

pub const PROFILE_UPDATED: &str = "הפרופיל עודכן בהצלחה";
pub const PROFILE_UPDATE_FAILED: &str = "אירעה שגיאה בעדכון הפרופיל";
