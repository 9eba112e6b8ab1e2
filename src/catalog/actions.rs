//! The action table. One entry per operation the orchestrator can perform.

use super::{ActionSpec, ParamSpec, ParamType, SafetyTier};

const fn required(name: &'static str, ty: ParamType, description: &'static str) -> ParamSpec {
    ParamSpec {
        name,
        ty,
        required: true,
        description,
    }
}

const fn optional(name: &'static str, ty: ParamType, description: &'static str) -> ParamSpec {
    ParamSpec {
        name,
        ty,
        required: false,
        description,
    }
}

pub const ACTIONS: &[ActionSpec] = &[
    // Channel management
    ActionSpec {
        name: "list_channels",
        description: "List all channels in the server",
        tier: SafetyTier::Safe,
        params: &[],
    },
    ActionSpec {
        name: "create_channel",
        description: "Create a new channel in the server",
        tier: SafetyTier::Safe,
        params: &[
            required("channel_name", ParamType::Text, "Name for the new channel"),
            optional(
                "channel_type",
                ParamType::Choice(&["text", "voice", "category"]),
                "Kind of channel to create",
            ),
            optional(
                "category",
                ParamType::Reference,
                "Category to place the channel in",
            ),
        ],
    },
    ActionSpec {
        name: "delete_channel",
        description: "Delete a channel from the server",
        tier: SafetyTier::Dangerous,
        params: &[required(
            "channel",
            ParamType::Reference,
            "Name or id of the channel to delete",
        )],
    },
    ActionSpec {
        name: "delete_category",
        description: "Delete a category and every channel inside it",
        tier: SafetyTier::Dangerous,
        params: &[required(
            "category",
            ParamType::Reference,
            "Name or id of the category to delete",
        )],
    },
    // Role management
    ActionSpec {
        name: "list_roles",
        description: "List all roles in the server",
        tier: SafetyTier::Safe,
        params: &[],
    },
    ActionSpec {
        name: "create_role",
        description: "Create a new role in the server",
        tier: SafetyTier::Safe,
        params: &[
            required("role_name", ParamType::Text, "Name for the new role"),
            optional(
                "color",
                ParamType::Text,
                "Hex color code (e.g. '#FF0000') or a color name",
            ),
            optional(
                "permissions",
                ParamType::TextList,
                "Permission names to grant to the role",
            ),
            optional(
                "hoist",
                ParamType::Flag,
                "Display the role separately in the member list",
            ),
            optional("mentionable", ParamType::Flag, "Allow mentioning the role"),
        ],
    },
    ActionSpec {
        name: "delete_role",
        description: "Delete a role from the server",
        tier: SafetyTier::Dangerous,
        params: &[required(
            "role",
            ParamType::Reference,
            "Name or id of the role to delete",
        )],
    },
    ActionSpec {
        name: "assign_role",
        description: "Assign a role to a member",
        tier: SafetyTier::Moderate,
        params: &[
            required("member", ParamType::Reference, "Member to assign the role to"),
            required("role", ParamType::Reference, "Role to assign"),
        ],
    },
    ActionSpec {
        name: "remove_role",
        description: "Remove a role from a member",
        tier: SafetyTier::Moderate,
        params: &[
            required("member", ParamType::Reference, "Member to remove the role from"),
            required("role", ParamType::Reference, "Role to remove"),
        ],
    },
    ActionSpec {
        name: "update_role_permissions",
        description: "Replace the permission set of a role",
        tier: SafetyTier::Dangerous,
        params: &[
            required("role", ParamType::Reference, "Role to update"),
            required(
                "permissions",
                ParamType::TextList,
                "Permission names the role should have",
            ),
        ],
    },
    // Moderation
    ActionSpec {
        name: "kick_member",
        description: "Kick a member from the server",
        tier: SafetyTier::Dangerous,
        params: &[
            required("member", ParamType::Reference, "Member to kick"),
            optional("reason", ParamType::Text, "Reason for the kick"),
        ],
    },
    ActionSpec {
        name: "ban_member",
        description: "Ban a member from the server",
        tier: SafetyTier::Dangerous,
        params: &[
            required("member", ParamType::Reference, "Member to ban"),
            optional("reason", ParamType::Text, "Reason for the ban"),
            optional(
                "delete_message_days",
                ParamType::Integer {
                    min: Some(0),
                    max: Some(7),
                },
                "Days of message history to delete",
            ),
        ],
    },
    ActionSpec {
        name: "setup_word_filter",
        description: "Automatically act on messages containing banned words",
        tier: SafetyTier::Dangerous,
        params: &[
            required(
                "banned_words",
                ParamType::TextList,
                "Words to filter out",
            ),
            optional(
                "action",
                ParamType::Choice(&["delete", "warn", "mute"]),
                "What to do when a banned word is found",
            ),
        ],
    },
    ActionSpec {
        name: "setup_anti_spam",
        description: "Enable anti-spam protection",
        tier: SafetyTier::Dangerous,
        params: &[
            required(
                "max_messages_per_minute",
                ParamType::Integer {
                    min: Some(1),
                    max: None,
                },
                "Messages allowed per minute per member",
            ),
            optional(
                "action",
                ParamType::Choice(&["warn", "mute", "kick"]),
                "What to do when spam is detected",
            ),
        ],
    },
    // Server management
    ActionSpec {
        name: "get_server_stats",
        description: "Get statistics about the server",
        tier: SafetyTier::Safe,
        params: &[],
    },
    ActionSpec {
        name: "backup_server",
        description: "Snapshot server channels, roles, and permissions",
        tier: SafetyTier::Moderate,
        params: &[],
    },
    ActionSpec {
        name: "restore_server",
        description: "Restore the server from a backup",
        tier: SafetyTier::Dangerous,
        params: &[optional(
            "backup_id",
            ParamType::Integer { min: None, max: None },
            "Backup to restore (defaults to the most recent)",
        )],
    },
    // Utility
    ActionSpec {
        name: "create_poll",
        description: "Create a poll in a channel",
        tier: SafetyTier::Safe,
        params: &[
            required("channel", ParamType::Reference, "Channel to post the poll in"),
            required("poll_question", ParamType::Text, "The poll question"),
            required("poll_options", ParamType::TextList, "Poll options"),
            optional(
                "duration_hours",
                ParamType::Integer {
                    min: Some(1),
                    max: None,
                },
                "How long the poll should run",
            ),
        ],
    },
    ActionSpec {
        name: "set_reminder",
        description: "Schedule a reminder message",
        tier: SafetyTier::Safe,
        params: &[
            required("channel", ParamType::Reference, "Channel to send the reminder to"),
            required("reminder_text", ParamType::Text, "The reminder message"),
            required(
                "reminder_time",
                ParamType::Text,
                "When to send it (e.g. 'in 1 hour')",
            ),
        ],
    },
];
