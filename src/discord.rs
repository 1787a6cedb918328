use super::event::{
    Author, ChannelRef, GatewayEvent, GuildRef, MemberData, MessageData, ReadySnapshot,
};
use serenity::{
    all::{Context, EventHandler, GatewayIntents, GuildId, Member, Message, Ready, User},
    async_trait,
};
use std::num::NonZeroU16;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc as channel;

/// GUILD_MEMBERS and MESSAGE_CONTENT are privileged and have to be enabled
/// in the developer portal.
pub fn intents() -> GatewayIntents {
    GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILD_MEMBERS
}

pub struct Handler {
    events: channel::Sender<GatewayEvent>,
    ready_recorded: AtomicBool,
}

impl Handler {
    pub fn new(events: channel::Sender<GatewayEvent>) -> Self {
        Self {
            events,
            ready_recorded: AtomicBool::new(false),
        }
    }

    /// `ready` fires again on every new gateway session, only the first one
    /// per process is recorded.
    fn claim_ready(&self) -> bool {
        !self.ready_recorded.swap(true, Ordering::SeqCst)
    }

    /// Returns whether the event reached the writer's queue.
    async fn dispatch(&self, event: GatewayEvent) -> bool {
        let event_type = event.event_type();

        match self.events.send(event).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(%event_type, "event writer is gone, dropping event: {}", e);
                false
            }
        }
    }
}

/// Messages from bots, this one included, are not logged.
fn records_message(msg: &Message) -> bool {
    !msg.author.bot
}

fn discriminator_tag(discriminator: Option<NonZeroU16>) -> String {
    match discriminator {
        Some(d) => format!("{:04}", d.get()),
        None => "0".to_string(),
    }
}

fn message_data(
    msg: &Message,
    channel_name: Option<String>,
    guild_name: Option<String>,
) -> MessageData {
    MessageData {
        message_id: msg.id.to_string(),
        content: msg.content.clone(),
        author: Author {
            id: msg.author.id.to_string(),
            username: msg.author.name.clone(),
            discriminator: discriminator_tag(msg.author.discriminator),
            avatar: msg.author.face(),
        },
        channel: ChannelRef {
            id: msg.channel_id.to_string(),
            name: channel_name,
        },
        guild: GuildRef {
            id: msg.guild_id.map(|id| id.to_string()),
            name: guild_name,
        },
    }
}

fn member_data(ctx: &Context, guild_id: GuildId, user: &User) -> MemberData {
    let (guild_name, member_count) = ctx
        .cache
        .guild(guild_id)
        .map(|guild| (Some(guild.name.clone()), Some(guild.member_count)))
        .unwrap_or((None, None));

    MemberData {
        user_id: user.id.to_string(),
        username: user.name.clone(),
        guild_id: guild_id.to_string(),
        guild_name,
        member_count,
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        tracing::info!("connected to discord as {}", ready.user.tag());

        if !self.claim_ready() {
            tracing::debug!("new gateway session, bot_ready already recorded");
            return;
        }

        let snapshot = ReadySnapshot {
            bot_name: ready.user.tag(),
            bot_id: ready.user.id.to_string(),
            guild_count: ready.guilds.len() as u64,
            user_count: ctx.cache.user_count() as u64,
        };

        self.dispatch(GatewayEvent::BotReady(snapshot)).await;
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if !records_message(&msg) {
            return;
        }

        let channel_name = msg.channel_id.name(&ctx).await.ok();
        let guild_name = msg.guild_id.and_then(|id| id.name(&ctx.cache));

        let data = message_data(&msg, channel_name, guild_name);
        self.dispatch(GatewayEvent::Message(data)).await;
    }

    async fn guild_member_addition(&self, ctx: Context, new_member: Member) {
        let member = member_data(&ctx, new_member.guild_id, &new_member.user);
        self.dispatch(GatewayEvent::MemberJoin(member)).await;
    }

    async fn guild_member_removal(
        &self,
        ctx: Context,
        guild_id: GuildId,
        user: User,
        _member_data_if_available: Option<Member>,
    ) {
        let member = member_data(&ctx, guild_id, &user);
        self.dispatch(GatewayEvent::MemberLeave(member)).await;
    }
}
