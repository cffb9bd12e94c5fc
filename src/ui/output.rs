use crate::ui::{err_theme, theme, Icons};
use crate::ContentUri;
use owo_colors::OwoColorize;

pub fn header(text: &str) {
    println!("{} {}", Icons::ROCKET, text.style(theme().heading.clone()));
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, label.style(theme().ok.clone()));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS, label.style(err_theme().failure.clone()));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(err_theme().caution.clone()));
}

pub fn info(label: &str, value: &str) {
    println!("{} {}: {}", Icons::INFO, label.style(theme().label.clone()), value);
}

pub fn section(title: &str) {
    println!();
    println!("━{}━", title.style(theme().heading.clone()));
}

pub fn dim(text: &str) -> String {
    text.style(theme().dim.clone()).to_string()
}

/// A content URI styled for stdout
pub fn uri(uri: &ContentUri) -> String {
    uri.to_string().style(theme().uri.clone()).to_string()
}

/// One line per delivered change event
pub fn change(changed: &ContentUri) {
    println!(
        "{} {} {}",
        Icons::BELL.style(theme().change.clone()),
        "changed".style(theme().label.clone()),
        uri(changed)
    );
}
