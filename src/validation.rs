use crate::error::{Error, Result};
use crate::model::{Film, User};
use chrono::{NaiveDate, Utc};

const MAX_DESCRIPTION_LENGTH: usize = 200;

const MIN_RELEASE_DATE: (i32, u32, u32) = (1895, 12, 28);

fn min_release_date() -> NaiveDate {
    let (year, month, day) = MIN_RELEASE_DATE;
    NaiveDate::from_ymd_opt(year, month, day).expect("MIN_RELEASE_DATE is a calendar date")
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

pub fn validate_film(film: &Film) -> Result<()> {
    if is_blank(&film.name) {
        return Err(Error::validation("Name should not be empty!"));
    }
    if film.description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(Error::validation(format!(
            "Description length should not be greater than {}!",
            MAX_DESCRIPTION_LENGTH
        )));
    }
    let min_release_date = min_release_date();
    if film.release_date < min_release_date {
        return Err(Error::validation(format!(
            "Release date should not be earlier than {}!",
            min_release_date
        )));
    }
    if film.duration <= 0 {
        return Err(Error::validation("Duration should be greater than 0!"));
    }
    Ok(())
}

// a missing display name falls back to the login
pub fn validate_user(user: &mut User) -> Result<()> {
    if is_blank(&user.email) || !user.email.contains('@') || user.email.contains(char::is_whitespace)
    {
        return Err(Error::validation("Email should be a valid address!"));
    }
    if is_blank(&user.login) {
        return Err(Error::validation("Login should not be empty!"));
    }
    if user.login.contains(char::is_whitespace) {
        return Err(Error::validation("Whitespaces are not allowed in login!"));
    }
    if user.birthday > Utc::now().date_naive() {
        return Err(Error::validation("Birthday should not be in the future!"));
    }
    if user.name.as_deref().map_or(true, is_blank) {
        user.name = Some(user.login.clone());
    }
    Ok(())
}
