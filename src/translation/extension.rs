//! 宿主入口
//!
//! 把后台服务、页面会话和设置存储组装在一起，并按消息类型分派。

use std::cell::RefCell;
use std::rc::Rc;

use markup5ever_rcdom::Handle;

use crate::translation::config::TranslatorConfig;
use crate::translation::error::{helpers, TranslationResult};
use crate::translation::gateway::{build_gateway_chain, TranslationGateway};
use crate::translation::messaging::{BackgroundService, Message, TranslateReply};
use crate::translation::observer::LayoutSource;
use crate::translation::session::PageSession;
use crate::translation::settings::{Settings, SettingsPatch, SettingsStore};

pub struct Extension {
    session: PageSession,
    background: Rc<BackgroundService>,
    settings: RefCell<SettingsStore>,
}

impl Extension {
    /// 用给定的翻译接口组装，必须在 `LocalSet` 内调用
    pub fn new(
        document: Handle,
        config: &TranslatorConfig,
        gateway: Box<dyn TranslationGateway>,
        layout: Box<dyn LayoutSource>,
        settings: SettingsStore,
    ) -> Self {
        let background = Rc::new(BackgroundService::new(
            gateway,
            config.gateway.max_parallel_requests,
        ));
        background.set_model(&settings.get().translation_model);

        let bridge = Rc::clone(&background).spawn();
        let session = PageSession::new(
            document,
            config,
            settings.get().clone(),
            Rc::new(bridge),
            layout,
        );

        Self {
            session,
            background,
            settings: RefCell::new(settings),
        }
    }

    /// 按配置创建远程接口链与设置存储
    pub fn from_config(
        document: Handle,
        config: &TranslatorConfig,
        layout: Box<dyn LayoutSource>,
    ) -> TranslationResult<Self> {
        let gateway = build_gateway_chain(&config.gateway)?;
        let store = SettingsStore::load(
            config.settings_path.as_deref(),
            Settings::from_config(config),
        )?;
        Ok(Self::new(document, config, Box::new(gateway), layout, store))
    }

    pub fn start(&self) {
        self.session.start();
    }

    pub fn session(&self) -> &PageSession {
        &self.session
    }

    pub fn settings(&self) -> Settings {
        self.settings.borrow().get().clone()
    }

    /// 处理一条消息，只有翻译请求有回复
    pub async fn dispatch(&self, message: Message) -> Option<TranslateReply> {
        match message {
            Message::Translate {
                texts,
                source,
                target,
            } => Some(
                self.background
                    .handle_translate(&texts, &source, &target)
                    .await,
            ),
            Message::UpdateSettings { settings } => {
                self.apply_settings(&settings);
                None
            }
            Message::TranslatePage => {
                self.session.reset_page();
                None
            }
        }
    }

    /// 处理 JSON 形式的消息，返回 JSON 形式的回复
    pub async fn dispatch_json(&self, raw: &str) -> TranslationResult<Option<String>> {
        let message: Message = serde_json::from_str(raw)?;
        match self.dispatch(message).await {
            Some(reply) => Ok(Some(serde_json::to_string(&reply)?)),
            None => Ok(None),
        }
    }

    fn apply_settings(&self, patch: &SettingsPatch) {
        // 写文件失败时内存中的设置仍然生效
        if let Err(e) = self.settings.borrow_mut().apply(patch) {
            helpers::log_error(&e);
        }
        if let Some(model) = &patch.translation_model {
            self.background.set_model(model);
        }
        self.session.update_settings(patch);
    }
}
