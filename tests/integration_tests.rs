use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tempfile::tempdir;
use serial_test::serial;
use anyhow::Result;
use async_trait::async_trait;

// 导入我们需要测试的模块
use xgram::bot::traits::BotTransport;
use xgram::bot::{BotProfile, Button, CallbackEvent, IncomingMessage, QueryIdScheme};
use xgram::logger::{BotLogger, FileLogger};
use xgram::{BotClient, CallbackOptions, CommandOptions, MentionPolicy, XgramError};

use teloxide::types::{ChatId, MessageId, UserId};
use teloxide::RequestError;

// Mock Bot API 实现
#[derive(Debug, Clone)]
pub struct MockBotApi {
    pub username: String,
    pub sent_messages: Arc<Mutex<Vec<MockSentMessage>>>,
    pub answered_queries: Arc<Mutex<Vec<String>>>,
    pub get_me_calls: Arc<AtomicUsize>,
    pub should_fail: Arc<Mutex<bool>>,
}

#[derive(Debug, Clone)]
pub struct MockSentMessage {
    pub chat_id: ChatId,
    pub text: String,
    pub buttons: Vec<Vec<Button>>,
}

impl MockBotApi {
    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            sent_messages: Arc::new(Mutex::new(Vec::new())),
            answered_queries: Arc::new(Mutex::new(Vec::new())),
            get_me_calls: Arc::new(AtomicUsize::new(0)),
            should_fail: Arc::new(Mutex::new(false)),
        }
    }

    pub async fn set_should_fail(&self, should_fail: bool) {
        *self.should_fail.lock().await = should_fail;
    }

    pub async fn get_sent_messages(&self) -> Vec<MockSentMessage> {
        self.sent_messages.lock().await.clone()
    }

    pub async fn get_answered_queries(&self) -> Vec<String> {
        self.answered_queries.lock().await.clone()
    }

    async fn check_failure(&self) -> Result<(), RequestError> {
        if *self.should_fail.lock().await {
            return Err(RequestError::Api(teloxide::ApiError::Unknown("Mock error".to_string())));
        }
        Ok(())
    }
}

#[async_trait]
impl BotTransport for MockBotApi {
    async fn get_me(&self) -> Result<BotProfile, RequestError> {
        self.get_me_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure().await?;

        Ok(BotProfile {
            id: UserId(4242),
            username: self.username.clone(),
            first_name: "Test Bot".to_string(),
        })
    }

    async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<MessageId, RequestError> {
        self.send_message_with_buttons(chat_id, text, Vec::new()).await
    }

    async fn send_message_with_buttons(
        &self,
        chat_id: ChatId,
        text: &str,
        buttons: Vec<Vec<Button>>,
    ) -> Result<MessageId, RequestError> {
        self.check_failure().await?;

        let mut messages = self.sent_messages.lock().await;
        messages.push(MockSentMessage {
            chat_id,
            text: text.to_string(),
            buttons,
        });
        Ok(MessageId(messages.len() as i32))
    }

    async fn answer_callback_query(&self, callback_query_id: &str) -> Result<(), RequestError> {
        self.check_failure().await?;
        self.answered_queries
            .lock()
            .await
            .push(callback_query_id.to_string());
        Ok(())
    }
}

const TEST_CHAT_ID: ChatId = ChatId(12345);

fn create_test_client(api: &MockBotApi, scheme: QueryIdScheme) -> BotClient {
    BotClient::with_scheme(Arc::new(api.clone()), scheme)
}

fn text_message(text: &str) -> IncomingMessage {
    IncomingMessage::new(TEST_CHAT_ID, MessageId(1), Some(text))
}

fn reply_command(client: &BotClient, name: &str, reply: &'static str, mention: MentionPolicy) -> Result<()> {
    client.command(
        name,
        move |client, message| async move {
            client.send_message(message.chat_id, reply).await?;
            Ok(())
        },
        CommandOptions::with_mention(mention),
    )?;
    Ok(())
}

// 测试没有处理器时的命令
#[tokio::test]
#[serial]
async fn test_command_without_handlers_is_noop() -> Result<()> {
    let api = MockBotApi::new("BotName");
    let client = create_test_client(&api, QueryIdScheme::Random);

    client.handle_message(text_message("/start")).await;
    client.handle_message(text_message("/start@BotName")).await;

    assert!(api.get_sent_messages().await.is_empty());
    assert_eq!(api.get_me_calls.load(Ordering::SeqCst), 0);
    Ok(())
}

// 测试非命令消息被忽略
#[tokio::test]
#[serial]
async fn test_plain_text_is_ignored() -> Result<()> {
    let api = MockBotApi::new("BotName");
    let client = create_test_client(&api, QueryIdScheme::Random);
    reply_command(&client, "start", "started", MentionPolicy::Both)?;

    client.handle_message(text_message("start")).await;
    client.handle_message(text_message("hello /start")).await;
    client
        .handle_message(IncomingMessage::new(TEST_CHAT_ID, MessageId(2), None))
        .await;

    assert!(api.get_sent_messages().await.is_empty());
    Ok(())
}

// 测试带提及的命令
#[tokio::test]
#[serial]
async fn test_mentioned_command() -> Result<()> {
    let api = MockBotApi::new("BotName");
    let client = create_test_client(&api, QueryIdScheme::Random);
    reply_command(&client, "start", "mentioned", MentionPolicy::OnlyWith)?;

    client.handle_message(text_message("/start@BotName")).await;

    let messages = api.get_sent_messages().await;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].text, "mentioned");
    assert_eq!(messages[0].chat_id, TEST_CHAT_ID);
    assert_eq!(api.get_me_calls.load(Ordering::SeqCst), 1);

    // 不带提及时 OnlyWith 不触发
    client.handle_message(text_message("/start")).await;
    assert_eq!(api.get_sent_messages().await.len(), 1);
    Ok(())
}

// 测试提及策略
#[tokio::test]
#[serial]
async fn test_mention_policies() -> Result<()> {
    let api = MockBotApi::new("BotName");
    let client = create_test_client(&api, QueryIdScheme::Random);
    reply_command(&client, "start", "without", MentionPolicy::OnlyWithout)?;
    reply_command(&client, "help", "both", MentionPolicy::Both)?;

    client.handle_message(text_message("/start")).await;
    client.handle_message(text_message("/start@BotName")).await;
    client.handle_message(text_message("/help")).await;
    client.handle_message(text_message("/help@BotName extra args")).await;

    let texts: Vec<String> = api
        .get_sent_messages()
        .await
        .into_iter()
        .map(|m| m.text)
        .collect();
    assert_eq!(texts, vec!["without", "both", "both"]);
    Ok(())
}

// 测试发给其他机器人的命令和格式错误的命令
#[tokio::test]
#[serial]
async fn test_foreign_and_malformed_mentions() -> Result<()> {
    let api = MockBotApi::new("BotName");
    let client = create_test_client(&api, QueryIdScheme::Random);
    reply_command(&client, "start", "started", MentionPolicy::Both)?;

    client.handle_message(text_message("/start@OtherBot")).await;
    client.handle_message(text_message("/start@BotName@BotName")).await;

    assert!(api.get_sent_messages().await.is_empty());
    // 格式错误的命令不会去查询机器人信息
    assert_eq!(api.get_me_calls.load(Ordering::SeqCst), 1);
    Ok(())
}

// 测试重复注册
#[tokio::test]
#[serial]
async fn test_duplicate_registration_keeps_first() -> Result<()> {
    let api = MockBotApi::new("BotName");
    let client = create_test_client(&api, QueryIdScheme::Sequential);
    reply_command(&client, "start", "first", MentionPolicy::Both)?;

    let result = reply_command(&client, "start", "second", MentionPolicy::Both);
    let error = result.unwrap_err();
    assert!(matches!(
        error.downcast_ref::<XgramError>(),
        Some(XgramError::DuplicateCommand { .. })
    ));

    client.handle_message(text_message("/start")).await;
    let messages = api.get_sent_messages().await;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].text, "first");

    let query = client.callback_query("menu", |_, _| async { Ok(()) }, CallbackOptions::default())?;
    let duplicate = client.callback_query("menu", |_, _| async { Ok(()) }, CallbackOptions::default());
    assert!(matches!(duplicate, Err(XgramError::DuplicateCallbackKey { .. })));
    assert_eq!(client.query_for("menu"), Some(query));
    assert_eq!(client.callback_count(), 1);
    Ok(())
}

// 测试先注册的命令优先
#[tokio::test]
#[serial]
async fn test_first_match_wins() -> Result<()> {
    let api = MockBotApi::new("BotName");
    let client = create_test_client(&api, QueryIdScheme::Random);
    reply_command(&client, "start", "only with", MentionPolicy::OnlyWith)?;

    // 同名命令不能再注册，所以第一个匹配的条目就是唯一的条目
    assert!(reply_command(&client, "/start", "other", MentionPolicy::OnlyWithout).is_err());

    client.handle_message(text_message("/start@BotName")).await;
    client.handle_message(text_message("/start")).await;

    let texts: Vec<String> = api.get_sent_messages().await.into_iter().map(|m| m.text).collect();
    assert_eq!(texts, vec!["only with"]);
    Ok(())
}

// 测试回调查询分发
#[tokio::test]
#[serial]
async fn test_callback_dispatch() -> Result<()> {
    let api = MockBotApi::new("BotName");
    let client = create_test_client(&api, QueryIdScheme::Random);

    let first_calls = Arc::new(AtomicUsize::new(0));
    let second_calls = Arc::new(AtomicUsize::new(0));

    let counter = first_calls.clone();
    let first = client.callback_query(
        "first",
        move |client, event| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                client.answer_callback_query(&event.id).await?;
                Ok(())
            }
        },
        CallbackOptions::default(),
    )?;

    let counter = second_calls.clone();
    client.callback_query(
        "second",
        move |_, _| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        },
        CallbackOptions::default(),
    )?;

    client
        .handle_callback_query(CallbackEvent::new("cq-1", Some(first.as_str())))
        .await;
    assert_eq!(first_calls.load(Ordering::SeqCst), 1);
    assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    assert_eq!(api.get_answered_queries().await, vec!["cq-1".to_string()]);

    // 未知数据和没有数据都不会触发处理器
    client
        .handle_callback_query(CallbackEvent::new("cq-2", Some("unknown")))
        .await;
    client.handle_callback_query(CallbackEvent::new("cq-3", None)).await;
    assert_eq!(first_calls.load(Ordering::SeqCst), 1);
    assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    Ok(())
}

// 测试按钮构建
#[tokio::test]
#[serial]
async fn test_button_builder() -> Result<()> {
    let api = MockBotApi::new("BotName");
    let client = create_test_client(&api, QueryIdScheme::Sequential);

    let pressed = Arc::new(AtomicUsize::new(0));
    let counter = pressed.clone();
    let button = client
        .button()
        .set_label("Press me")
        .set_handler(move |_, _| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })?
        .build();

    assert_eq!(button.label, "Press me");
    assert_eq!(button.callback_data, "0");
    assert_eq!(client.callback_count(), 1);

    let empty = client.button().set_label("No handler").build();
    assert_eq!(empty.callback_data, "");

    client
        .send_message_with_buttons(TEST_CHAT_ID, "Pick one", vec![vec![button.clone(), empty]])
        .await?;
    let messages = api.get_sent_messages().await;
    assert_eq!(messages[0].buttons[0].len(), 2);

    client
        .handle_callback_query(CallbackEvent::new("cq", Some(button.callback_data.as_str())))
        .await;
    assert_eq!(pressed.load(Ordering::SeqCst), 1);
    Ok(())
}

// 测试随机唯一键
#[tokio::test]
#[serial]
async fn test_unique_keys_do_not_collide() -> Result<()> {
    let api = MockBotApi::new("BotName");
    let client = create_test_client(&api, QueryIdScheme::Random);

    let mut queries = Vec::new();
    for _ in 0..50 {
        let key = client.unique_key()?;
        assert_eq!(key.len(), 10);
        assert!(client.query_for(&key).is_none());
        queries.push(client.callback_query(&key, |_, _| async { Ok(()) }, CallbackOptions::default())?);
    }

    queries.sort();
    queries.dedup();
    assert_eq!(queries.len(), 50);
    Ok(())
}

// 测试传输层失败
#[tokio::test]
#[serial]
async fn test_transport_failure() -> Result<()> {
    let api = MockBotApi::new("BotName");
    let client = create_test_client(&api, QueryIdScheme::Random);
    reply_command(&client, "start", "started", MentionPolicy::Both)?;

    api.set_should_fail(true).await;

    // 处理器返回的错误只记录日志
    client.handle_message(text_message("/start")).await;
    // 无法获取机器人信息时忽略带提及的命令
    client.handle_message(text_message("/start@BotName")).await;

    let result = client.send_message(TEST_CHAT_ID, "direct").await;
    assert!(matches!(result, Err(XgramError::Telegram(_))));

    api.set_should_fail(false).await;
    assert!(api.get_sent_messages().await.is_empty());
    Ok(())
}

// 测试自定义日志器
#[tokio::test]
#[serial]
async fn test_file_logger_receives_dispatch_logs() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("latest.log");

    let api = MockBotApi::new("BotName");
    let client = create_test_client(&api, QueryIdScheme::Random);
    client.set_logger(Arc::new(FileLogger::new(&path)?.quiet()));

    client.command(
        "fail",
        |_, _| async { Err(anyhow::anyhow!("handler exploded")) },
        CommandOptions::default(),
    )?;
    client.handle_message(text_message("/fail")).await;
    client.logger().log("done");

    let content = std::fs::read_to_string(&path)?;
    assert!(content.contains("[DEBUG] Registered command /fail"));
    assert!(content.contains("[ERROR] Command /fail failed: handler exploded"));
    assert!(content.contains("[INFO] done"));
    Ok(())
}
