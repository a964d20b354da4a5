//! HTML pages.
//!
//! The only module that produces markup; everything upstream hands it
//! structured rows. Untrusted text goes through `ammonia::clean_text`
//! before interpolation.

use mailview_graph::{ContactRow, EventRow, GraphError, MessageRow};

fn esc(text: &str) -> String {
    ammonia::clean_text(text)
}

fn layout(title: &str, nav: Option<&str>, body: &str) -> String {
    let nav = nav
        .map(|user| {
            format!(
                r#"<p>Signed in as {} | <a href="/mail">Inbox</a> | <a href="/calendar">Calendar</a> | <a href="/contacts">Contacts</a> | <a href="/authorize/signout">Sign out</a></p>"#,
                esc(user)
            )
        })
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{} - MailView</title>
    <style>
        body {{ font-family: system-ui, sans-serif; margin: 2rem; }}
        table {{ border-collapse: collapse; }}
        th, td {{ border: 1px solid #ccc; padding: 0.4rem 0.8rem; text-align: left; }}
    </style>
</head>
<body>
{}{}
</body>
</html>"#,
        esc(title),
        nav,
        body
    )
}

/// Sign-in entry point.
pub(crate) fn sign_in(auth_url: &str) -> String {
    let body = format!(
        r#"<p>Please <a href="{}">sign in</a> with your Office 365 or Outlook.com account.</p>"#,
        esc(auth_url)
    );
    layout("Home", None, &body)
}

/// Home page once a token cookie group exists.
pub(crate) fn home_signed_in(user: &str) -> String {
    layout("Home", Some(user), "<p>Pick a page above.</p>")
}

/// Terminal error page; `detail` carries the upstream message and
/// status where one was received.
pub(crate) fn error(message: &str, detail: &str) -> String {
    let body = format!(
        "<div><h1>Error</h1></div><p>{}</p><p>ERROR: {}</p>",
        esc(message),
        esc(detail)
    );
    layout("Error", None, &body)
}

pub(crate) fn mail(user: &str, rows: &[MessageRow]) -> String {
    let mut body = String::from("<div><h1>Your inbox</h1></div>");
    body.push_str("<table><tr><th>From</th><th>Subject</th><th>Received</th></tr>");
    for row in rows {
        // Unread subjects render bold
        let subject = if row.is_read {
            esc(&row.subject)
        } else {
            format!("<b>{}</b>", esc(&row.subject))
        };
        body.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            esc(&row.from),
            subject,
            esc(&row.received)
        ));
    }
    body.push_str("</table>");
    layout("Inbox", Some(user), &body)
}

pub(crate) fn calendar(user: &str, rows: &[EventRow]) -> String {
    let mut body = String::from("<div><h1>Your calendar</h1></div>");
    body.push_str("<table><tr><th>Subject</th><th>Start</th><th>End</th><th>Attendees</th></tr>");
    for row in rows {
        body.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            esc(&row.subject),
            esc(&row.start),
            esc(&row.end),
            esc(&row.attendee_summary)
        ));
    }
    body.push_str("</table>");
    layout("Calendar", Some(user), &body)
}

pub(crate) fn contacts(user: &str, rows: &[ContactRow]) -> String {
    let mut body = String::from("<div><h1>Your contacts</h1></div>");
    body.push_str("<table><tr><th>First name</th><th>Last name</th><th>Email</th></tr>");
    for row in rows {
        body.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            esc(&row.given_name),
            esc(&row.surname),
            esc(&row.primary_email)
        ));
    }
    body.push_str("</table>");
    layout("Contacts", Some(user), &body)
}

/// A resource page whose upstream call failed: the error renders inline
/// and the session is left alone.
pub(crate) fn resource_error(user: &str, heading: &str, error: &GraphError) -> String {
    let body = format!(
        "<div><h1>{}</h1></div><p>ERROR: {}</p>",
        esc(heading),
        esc(&error.to_string())
    );
    layout(heading, Some(user), &body)
}
