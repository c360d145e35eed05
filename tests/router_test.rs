//! Command Router Integration Tests
//! Run with: cargo test --test router_test

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};

use zincite::application::errors::CommandError;
use zincite::application::messaging::{
    callback, BotCommand, CallbackBinding, CallbackListener, CallbackOutcome, CallbackResult, CallbackTable,
    CommandContext, CommandResult, CommandRouter,
};
use zincite::domain::entities::{ArgumentSpec, CallbackEvent, Chat, CommandDescriptor, IncomingMessage, User};

static INIT: Once = Once::new();

fn ensure_init() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

fn message(text: &str) -> IncomingMessage {
    IncomingMessage::new(Chat::new("100"), User::new("7").with_username("ana"), text)
}

fn give_command() -> CommandDescriptor {
    CommandDescriptor::new("/give")
        .with_description("Give an amount to someone")
        .with_argument(ArgumentSpec::required::<String>("nombre", "Who receives"))
        .with_argument(ArgumentSpec::optional::<i32>("cantidad", "How much"))
}

fn describe(ctx: &CommandContext) -> String {
    let nombre = match ctx.get::<String>("nombre") {
        Ok(value) => format!("{:?}", value),
        Err(e) => format!("error: {}", e),
    };
    let cantidad = match ctx.get::<i32>("cantidad") {
        Ok(value) => format!("{:?}", value),
        Err(CommandError::Parse { token, .. }) => format!("parse error on {}", token),
        Err(e) => format!("error: {}", e),
    };
    format!("{} {}", nombre, cantidad)
}

fn router_with_give() -> CommandRouter {
    let router = CommandRouter::new();
    router
        .register_fn(give_command(), |_, ctx| Ok(Some(describe(ctx))))
        .unwrap();
    router
}

#[test]
fn test_alias_lookup_ignores_case() {
    ensure_init();
    let router = CommandRouter::new();
    router
        .register_fn(
            CommandDescriptor::new("/comando").with_alias("/alias").with_description("d"),
            |_, _| Ok(None),
        )
        .unwrap();

    let found = router.resolve("/ALIAS").expect("alias should resolve");
    assert_eq!(found.name(), "/comando");
    assert_eq!(found.descriptor.aliases()[0], found.name());
    assert!(router.resolve("/Comando").is_some());
    assert!(router.resolve("/other").is_none());
}

#[test]
fn test_every_alias_shares_one_command() {
    ensure_init();
    let router = CommandRouter::new();
    router
        .register_fn(
            CommandDescriptor::new("/a").with_aliases(["/b", "/c"]).with_description("three names"),
            |_, _| Ok(None),
        )
        .unwrap();

    let a = router.get_command("/a").unwrap();
    let b = router.get_command("/b").unwrap();
    let c = router.get_command("/c").unwrap();
    assert!(a.same_as(&b));
    assert!(b.same_as(&c));
    assert_eq!(router.len(), 3);
    assert_eq!(router.commands().len(), 1);
}

#[test]
fn test_optional_argument_absent() {
    ensure_init();
    let reply = router_with_give().dispatch(&message("/give John")).unwrap().unwrap();
    assert_eq!(reply.command, "/give");
    assert_eq!(reply.reply.as_deref(), Some("Some(\"John\") None"));
}

#[test]
fn test_malformed_token_is_parse_error() {
    ensure_init();
    let reply = router_with_give().dispatch(&message("/give John abc")).unwrap().unwrap();
    assert_eq!(reply.reply.as_deref(), Some("Some(\"John\") parse error on abc"));
}

#[test]
fn test_undeclared_argument_fails_for_any_tokens() {
    ensure_init();
    let router = CommandRouter::new();
    router
        .register_fn(give_command(), |_, ctx| {
            ctx.get::<String>("missing_name")?;
            Ok(Some("unreachable".to_string()))
        })
        .unwrap();

    for text in ["/give", "/give John", "/give John 5 extra"] {
        match router.dispatch(&message(text)) {
            Err(CommandError::ArgumentNotDeclared { argument, .. }) => assert_eq!(argument, "missing_name"),
            other => panic!("unexpected result for {}: {:?}", text, other.map(|d| d.map(|d| d.command))),
        }
    }
}

#[test]
fn test_repeated_get_is_stable() {
    ensure_init();
    let router = CommandRouter::new();
    router
        .register_fn(give_command(), |_, ctx| {
            let first = ctx.get::<i32>("cantidad")?;
            let second = ctx.get::<i32>("cantidad")?;
            assert_eq!(first, second);
            Ok(first.map(|n| n.to_string()))
        })
        .unwrap();

    let dispatched = router.dispatch(&message("/give John 12")).unwrap().unwrap();
    assert_eq!(dispatched.reply.as_deref(), Some("12"));
}

#[test]
fn test_plain_text_is_not_a_command() {
    ensure_init();
    let router = router_with_give();
    assert!(router.dispatch(&message("hello there")).unwrap().is_none());
    assert!(router.dispatch(&message("/unknown")).unwrap().is_none());
    assert!(router.dispatch(&message("")).unwrap().is_none());
}

struct Poll {
    votes: AtomicUsize,
}

impl Poll {
    fn vote(&self, event: &CallbackEvent) -> CallbackResult {
        let total = self.votes.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Some(format!("{} ({} votes)", event.payload().unwrap_or_default(), total)))
    }

    fn close(&self, _event: &CallbackEvent) -> CallbackResult {
        Err(CommandError::ExecutionFailed("poll closed".to_string()))
    }
}

impl CallbackListener for Poll {
    fn callback_table(&self) -> CallbackTable<Self> {
        CallbackTable::new().on("vote", Poll::vote).on("close", Poll::close)
    }
}

#[test]
fn test_callbacks_route_by_tag() {
    ensure_init();
    let router = CommandRouter::new();
    let poll = Arc::new(Poll { votes: AtomicUsize::new(0) });
    router.register_callback_listener(Arc::clone(&poll));

    let user = User::new("7");
    let vote = CallbackEvent::new("q1", user.clone(), "vote#yes");
    assert_eq!(
        router.dispatch_callback(&vote),
        CallbackOutcome::Handled { reply: Some("yes (1 votes)".to_string()) }
    );

    let close = CallbackEvent::new("q2", user.clone(), "close");
    assert_eq!(router.dispatch_callback(&close), CallbackOutcome::Failed);

    let unknown = CallbackEvent::new("q3", user, "other#1");
    assert_eq!(router.dispatch_callback(&unknown), CallbackOutcome::NoMatch);
    assert_eq!(poll.votes.load(Ordering::SeqCst), 1);
}

/// Command that also answers the buttons it sends
struct Voting {
    descriptor: CommandDescriptor,
    ballots: AtomicUsize,
}

impl Voting {
    fn new() -> Self {
        Self {
            descriptor: CommandDescriptor::new("/vote").with_description("Start a vote"),
            ballots: AtomicUsize::new(0),
        }
    }

    fn ballot(&self, event: &CallbackEvent) -> CallbackResult {
        self.ballots.fetch_add(1, Ordering::SeqCst);
        Ok(Some(format!("counted {}", event.payload().unwrap_or_default())))
    }
}

impl BotCommand for Voting {
    fn descriptor(&self) -> &CommandDescriptor {
        &self.descriptor
    }

    fn execute(&self, _message: &IncomingMessage, _ctx: &CommandContext) -> CommandResult {
        Ok(Some("Vote started".to_string()))
    }

    fn callback_bindings(self: Arc<Self>) -> Vec<CallbackBinding> {
        callback::bind(self)
    }
}

impl CallbackListener for Voting {
    fn callback_table(&self) -> CallbackTable<Self> {
        CallbackTable::new().on("ballot", Voting::ballot)
    }
}

#[test]
fn test_command_registers_its_callback_handlers() {
    ensure_init();
    let router = CommandRouter::new();
    let voting = Arc::new(Voting::new());
    router.register(voting.clone()).unwrap();

    let started = router.dispatch(&message("/vote")).unwrap().unwrap();
    assert_eq!(started.reply.as_deref(), Some("Vote started"));

    assert!(router.resolve_callback("ballot").is_some());
    let event = CallbackEvent::new("q1", User::new("7"), "ballot#yes");
    assert_eq!(
        router.dispatch_callback(&event),
        CallbackOutcome::Handled { reply: Some("counted yes".to_string()) }
    );
    assert_eq!(voting.ballots.load(Ordering::SeqCst), 1);
}

#[test]
fn test_help_entries_skip_hidden_and_unprefixed() {
    ensure_init();
    let router = CommandRouter::new();
    router
        .register_fn(CommandDescriptor::new("/weather").with_description("Show the forecast"), |_, _| Ok(None))
        .unwrap();
    router
        .register_fn(CommandDescriptor::new("/secret").with_description("Hidden thing").hidden(), |_, _| Ok(None))
        .unwrap();
    router
        .register_fn(CommandDescriptor::new("good morning").with_description("Greeting phrase"), |_, _| Ok(None))
        .unwrap();

    let entries = router.help_entries();
    let names: Vec<&str> = entries.iter().map(|e| e.command.as_str()).collect();
    assert_eq!(names, vec!["/weather"]);
}
