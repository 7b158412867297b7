use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupportContact {
    pub phone: String,
    pub email: String,
}

impl Default for SupportContact {
    fn default() -> Self {
        Self {
            phone: "+8801568082587".to_string(),
            email: "info@justicehalfmarathon.com".to_string(),
        }
    }
}

pub const EMPTY_SEARCH: &str = "দয়া করে আপনার ফোন নম্বর বা ট্রানজাকশন আইডি লিখুন / Please enter your phone number or transaction ID";
pub const LOOKUP_FAILED: &str = "একটি ত্রুটি ঘটেছে। আবার চেষ্টা করুন। / An error occurred. Please try again.";
pub const FOUND: &str = "তথ্য পাওয়া গেছে! আপনার রেজিস্ট্রেশন তথ্য সফলভাবে খুঁজে পাওয়া গেছে। / Your registration details were found.";
pub const CONFIRMED: &str = "নিশ্চিতকরণ সফল! আপনার তথ্য সফলভাবে নিশ্চিত করা হয়েছে। / Details confirmed successfully!";
pub const ALREADY_CONFIRMED: &str = "আপনার তথ্য ইতিমধ্যে নিশ্চিত করা হয়েছে। / Details already confirmed.";
pub const UPDATED: &str = "তথ্য আপডেট সফল! আপনার তথ্য সফলভাবে আপডেট করা হয়েছে। / Details updated successfully!";
pub const CONFIRM_FAILED: &str = "Failed to confirm details. Please try again.";
pub const SAVE_FAILED: &str = "Failed to save changes. Please try again.";
pub const EMPTY_NAME: &str = "নাম খালি রাখা যাবে না / Full name cannot be empty";
pub const LOCKED: &str = "নিশ্চিত করা তথ্য পরিবর্তন করা যাবে না / Confirmed details can no longer be changed";
pub const NOT_EDITING: &str = "No edit in progress";
pub const EDITING: &str = "Save or cancel the current edit first";
pub const FORBIDDEN: &str = "Admin session required";

pub fn not_found(support: &SupportContact) -> String {
    format!(
        "কোনো রানার পাওয়া যায়নি। যোগাযোগ করুন: {phone} অথবা {email} / No runner found. Contact: {phone} or {email}",
        phone = support.phone,
        email = support.email,
    )
}
