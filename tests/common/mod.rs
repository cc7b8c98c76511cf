// 集成测试公共模块
//
// 提供模拟翻译接口、固定布局和 DOM 辅助工具

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use markup5ever_rcdom::{Handle, RcDom};

use inline_translator::parsers::html::{
    descendant_elements, get_node_name, get_parent_node, has_class, html_to_dom, is_element,
    text_content,
};
use inline_translator::translation::gateway::split_translations;
use inline_translator::translation::{
    LayoutSource, PageSession, Rect, Settings, TranslationError, TranslationGateway,
    TranslationResult, TranslatorConfig, Viewport,
};

/// 模拟接口的调用记录，克隆后共享
#[derive(Clone, Default)]
pub struct CallLog {
    calls: Rc<RefCell<Vec<Vec<String>>>>,
    in_flight: Rc<Cell<usize>>,
    peak: Rc<Cell<usize>>,
}

impl CallLog {
    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.borrow().clone()
    }

    /// 所有请求中的文本总数
    pub fn total_texts(&self) -> usize {
        self.calls.borrow().iter().map(Vec::len).sum()
    }

    /// 同时进行中的请求数峰值
    pub fn peak(&self) -> usize {
        self.peak.get()
    }
}

/// 可配置的模拟翻译接口
///
/// 默认给每段原文加上前缀作为译文；设置 `reply` 后模拟模型返回一整段回复。
pub struct MockGateway {
    name: String,
    log: CallLog,
    prefix: String,
    reply: Option<String>,
    delay: Duration,
    failures_left: Cell<usize>,
}

impl MockGateway {
    pub fn new() -> (Self, CallLog) {
        let log = CallLog::default();
        let gateway = Self {
            name: "mock".to_string(),
            log: log.clone(),
            prefix: "译文:".to_string(),
            reply: None,
            delay: Duration::ZERO,
            failures_left: Cell::new(0),
        };
        (gateway, log)
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_string();
        self
    }

    pub fn with_reply(mut self, reply: &str) -> Self {
        self.reply = Some(reply.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// 前 `times` 次请求失败
    pub fn failing(self, times: usize) -> Self {
        self.failures_left.set(times);
        self
    }
}

#[async_trait(?Send)]
impl TranslationGateway for MockGateway {
    fn name(&self) -> &str {
        &self.name
    }

    async fn translate(
        &self,
        texts: &[String],
        _source: &str,
        _target: &str,
    ) -> TranslationResult<Vec<String>> {
        self.log.calls.borrow_mut().push(texts.to_vec());

        let in_flight = self.log.in_flight.get() + 1;
        self.log.in_flight.set(in_flight);
        self.log.peak.set(self.log.peak.get().max(in_flight));

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.log.in_flight.set(self.log.in_flight.get() - 1);

        let failures = self.failures_left.get();
        if failures > 0 {
            self.failures_left.set(failures - 1);
            return Err(TranslationError::NetworkError(format!("{} 不可用", self.name)));
        }

        match &self.reply {
            Some(reply) => Ok(split_translations(reply, texts.len())),
            None => Ok(texts
                .iter()
                .map(|text| format!("{}{}", self.prefix, text))
                .collect()),
        }
    }
}

/// 所有元素都在页面顶部的布局
pub struct AllVisible;

impl LayoutSource for AllVisible {
    fn bounding_rect(&self, _node: &Handle) -> Option<Rect> {
        Some(Rect::new(0.0, 0.0, 800.0, 20.0))
    }
}

/// 页面顶部的视口
pub fn top_viewport() -> Viewport {
    Viewport::new(0.0, 800.0, 600.0)
}

/// DOM测试工具
pub struct HtmlTestHelper;

impl HtmlTestHelper {
    pub fn dom(html: &str) -> RcDom {
        html_to_dom(html.as_bytes(), "")
    }

    /// 按文档顺序取出指定标签的元素，不含译文
    pub fn elements_named(dom: &RcDom, name: &str) -> Vec<Handle> {
        descendant_elements(&dom.document)
            .into_iter()
            .filter(|n| get_node_name(n) == Some(name))
            .filter(|n| !has_class(n, "translation-wrapper"))
            .collect()
    }

    /// 页面中的全部译文元素
    pub fn translations(dom: &RcDom) -> Vec<Handle> {
        descendant_elements(&dom.document)
            .into_iter()
            .filter(|n| has_class(n, "translation-wrapper"))
            .collect()
    }

    /// 紧随其后的兄弟元素
    pub fn next_element(node: &Handle) -> Option<Handle> {
        let parent = get_parent_node(node)?;
        let children = parent.children.borrow();
        let index = children.iter().position(|c| Rc::ptr_eq(c, node))?;
        children[index + 1..].iter().find(|c| is_element(c)).cloned()
    }

    /// 原文后的译文文本
    pub fn translation_of(node: &Handle) -> Option<String> {
        Self::next_element(node)
            .filter(|n| has_class(n, "translation-wrapper"))
            .map(|n| text_content(&n))
    }

    /// 中文填充，让容器整体不被判定为英文
    pub fn filler() -> String {
        "中文".repeat(100)
    }
}

/// 测试会话构建器
pub struct SessionBuilder {
    config: TranslatorConfig,
    settings: Settings,
    layout: Box<dyn LayoutSource>,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self {
            config: TranslatorConfig::default(),
            settings: Settings::default(),
            layout: Box::new(AllVisible),
        }
    }

    pub fn config(mut self, configure: impl FnOnce(&mut TranslatorConfig)) -> Self {
        configure(&mut self.config);
        self
    }

    pub fn settings(mut self, configure: impl FnOnce(&mut Settings)) -> Self {
        configure(&mut self.settings);
        self
    }

    pub fn layout(mut self, layout: Box<dyn LayoutSource>) -> Self {
        self.layout = layout;
        self
    }

    pub fn build(self, dom: &RcDom, gateway: Rc<dyn TranslationGateway>) -> PageSession {
        PageSession::new(
            dom.document.clone(),
            &self.config,
            self.settings,
            gateway,
            self.layout,
        )
    }
}

/// 等待会话空闲的上限（暂停时钟下只是虚拟时间）
pub const IDLE_LIMIT: Duration = Duration::from_secs(120);
