//! Writes TypeScript declarations for every wire type, plus the channel and
//! mutation tables the client needs.

use std::{fs, path::PathBuf};

use anyhow::Context;
use api_types::{
    AtlassianAuth, Channel, EventType, KickOutNotification, Meeting, MeetingRef, MeetingType,
    Notification, NotificationStatus, NotificationType, PayloadTeam, Provider, ProviderService,
    PublishEvent, PublishOptions, RemoveTeamMemberPayload, RemoveTeamMemberRequest,
    RemovedTeamMember, SetNotificationStatusPayload, SetNotificationStatusRequest, SlackAuth,
    StandardMutationError, SubscriptionPayload, Task, Team, TeamMember, TeamMemberIntegrations,
    TeamMemberPresence, User,
};
use server::{channels::all_channels, routes::mutations::metadata};
use ts_rs::TS;

fn main() -> anyhow::Result<()> {
    let out = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("shared/types.ts"));

    let decls = [
        Channel::decl(),
        EventType::decl(),
        MeetingType::decl(),
        NotificationStatus::decl(),
        NotificationType::decl(),
        ProviderService::decl(),
        User::decl(),
        Team::decl(),
        TeamMember::decl(),
        PayloadTeam::decl(),
        Task::decl(),
        Meeting::decl(),
        MeetingRef::decl(),
        Notification::decl(),
        KickOutNotification::decl(),
        AtlassianAuth::decl(),
        Provider::decl(),
        SlackAuth::decl(),
        TeamMemberIntegrations::decl(),
        StandardMutationError::decl(),
        RemovedTeamMember::decl(),
        RemoveTeamMemberRequest::decl(),
        RemoveTeamMemberPayload::decl(),
        SetNotificationStatusRequest::decl(),
        SetNotificationStatusPayload::decl(),
        TeamMemberPresence::decl(),
        SubscriptionPayload::decl(),
        PublishOptions::decl(),
        PublishEvent::decl(),
    ];

    let mut output = String::from("// This file was generated by `generate-types`. Do not edit.\n\n");
    for decl in decls {
        output.push_str("export ");
        output.push_str(&decl);
        output.push_str("\n\n");
    }

    output.push_str("export const CHANNELS = {\n");
    for definition in all_channels() {
        output.push_str(&format!(
            "  {}: \"{}\",\n",
            definition.channel().as_str(),
            definition.ts_type_name()
        ));
    }
    output.push_str("} as const;\n\n");

    output.push_str("export const MUTATIONS = {\n");
    for meta in metadata() {
        output.push_str(&format!(
            "  {}: {{ url: \"{}\", request: \"{}\", payload: \"{}\" }},\n",
            meta.name, meta.url, meta.request_type, meta.payload_type
        ));
    }
    output.push_str("} as const;\n");

    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(&out, output).with_context(|| format!("failed to write {}", out.display()))?;
    println!("wrote {}", out.display());
    Ok(())
}
