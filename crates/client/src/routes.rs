//! Route matchers used to decide whether the user is looking at something
//! that just went away.

/// Whether `pathname` is the team page (or a sub page) of `team_id`.
pub fn on_team_route(pathname: &str, team_id: &str) -> bool {
    pathname
        .strip_prefix("/team/")
        .and_then(|rest| rest.split('/').next())
        .is_some_and(|segment| segment == team_id)
}

/// Whether `pathname` is the meeting page of one of `meeting_ids`.
pub fn on_meeting_route(pathname: &str, meeting_ids: &[&str]) -> bool {
    let mut segments = pathname.split('/').skip(1);
    match (segments.next(), segments.next()) {
        (Some("meet"), Some(meeting_id)) => meeting_ids.contains(&meeting_id),
        _ => false,
    }
}
