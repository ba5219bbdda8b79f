use guarantor_notify::domain::entities::Notification;
use serde_json::{json, Value};
use std::sync::Mutex;

use guarantor_notify::domain::ports::view_binding::{Notice, NoticeLevel, ViewBinding};

pub fn guarantor_request(id: u64, loan_id: u64, is_read: bool) -> Value {
    // Requests arrive with integer flags
    let read_flag = u8::from(is_read);
    json!({
        "id": id,
        "type": "guarantor_request",
        "title": "Guarantor request",
        "message": "Jane Wanjiru asked you to guarantee a loan",
        "human_date": "2 minutes ago",
        "is_read": read_flag,
        "data": { "loan_id": loan_id, "applicant_name": "Jane Wanjiru" }
    })
}

pub fn guarantor_acceptance(id: u64, loan_id: u64, is_read: bool) -> Value {
    json!({
        "id": id,
        "type": "guarantor_acceptance",
        "title": "Guarantor accepted",
        "message": "Peter Otieno accepted your guarantor request",
        "human_date": "1 hour ago",
        "is_read": is_read,
        "data": { "loan_id": loan_id }
    })
}

pub fn guarantor_rejection(id: u64, loan_id: u64, is_read: bool) -> Value {
    json!({
        "id": id,
        "type": "guarantor_rejection",
        "title": "Guarantor declined",
        "message": "Peter Otieno declined your guarantor request",
        "human_date": "yesterday",
        "is_read": is_read,
        "data": { "loan_id": loan_id }
    })
}

pub fn general_notice(id: u64) -> Value {
    json!({
        "id": id,
        "type": "system_announcement",
        "title": "Maintenance",
        "message": "Scheduled maintenance tonight",
        "human_date": "3 days ago",
        "is_read": false,
        "data": null
    })
}

/// Stream payload carrying the given notifications
pub fn snapshot_json(items: &[Value]) -> String {
    json!({ "success": true, "data": items }).to_string()
}

pub fn notification(value: Value) -> Notification {
    serde_json::from_value(value).expect("fixture should decode")
}

/// Three notifications, two of them unread
pub fn sample_items() -> Vec<Value> {
    vec![
        guarantor_request(1, 301, false),
        guarantor_acceptance(2, 302, false),
        guarantor_rejection(3, 303, true),
    ]
}

pub fn sample_notifications() -> Vec<Notification> {
    sample_items().into_iter().map(notification).collect()
}

/// View binding that records everything it is asked to show
#[derive(Default)]
pub struct RecordingView {
    notices: Mutex<Vec<Notice>>,
    opened: Mutex<Vec<String>>,
}

impl RecordingView {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter(|n| n.level == NoticeLevel::Error)
            .map(|n| n.message)
            .collect()
    }

    pub fn successes(&self) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter(|n| n.level == NoticeLevel::Success)
            .map(|n| n.message)
            .collect()
    }

    pub fn opened_loans(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

impl ViewBinding for RecordingView {
    fn show_notice(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }

    fn open_loan_details(&self, loan_id: &str) {
        self.opened.lock().unwrap().push(loan_id.to_string());
    }
}
