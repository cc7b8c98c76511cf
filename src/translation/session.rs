//! 页面翻译会话
//!
//! 一个会话对应一个页面，在单线程事件循环上运行：视口变化时扫描进入视口的元素，
//! 提取段落加入待翻译队列，按批次发给翻译接口，再把译文插到原文之后。
//! 所有计时器和批次任务都通过 `spawn_local` 运行，会话必须在 `LocalSet` 内使用。
//!
//! 页面重置会增加 `epoch`。重置前发出的批次返回后只写缓存，不再修改页面，
//! 也不会影响新的队列。

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use markup5ever_rcdom::Handle;
use tracing::{debug, info};

use crate::parsers::html::{descendant_elements, detach, has_class, is_connected};
use crate::translation::config::{constants, TranslatorConfig};
use crate::translation::error::{helpers, TranslationResult};
use crate::translation::gateway::TranslationGateway;
use crate::translation::inserter::{StyleSource, TranslationInserter};
use crate::translation::observer::{
    collect_observable, should_observe, Debouncer, LayoutSource, MutationRecord,
    VisibilityObserver, Viewport,
};
use crate::translation::pipeline::markers::{clear_marks, is_completed, mark_scanned};
use crate::translation::pipeline::{
    BatchLimits, BatchPlan, BatchStats, NodeSet, ParagraphExtractor, PendingQueue, TextFilter,
};
use crate::translation::settings::{Settings, SettingsPatch};
use crate::translation::storage::{CacheStats, TranslationCache};

/// 会话状态快照
#[derive(Debug, Clone)]
pub struct SessionStats {
    pub batches: BatchStats,
    pub cache: CacheStats,
    pub cached_entries: usize,
    pub pending: usize,
    pub processing: usize,
    pub active_batches: usize,
    pub observed: usize,
    pub processed: usize,
    pub epoch: u64,
}

struct SessionState {
    document: Handle,
    source_lang: String,
    target_lang: String,
    limits: BatchLimits,
    drain_delay: Duration,
    rescan_delay: Duration,
    settings: Settings,
    filter: TextFilter,
    cache: TranslationCache,
    queue: PendingQueue,
    processed: NodeSet,
    visibility: VisibilityObserver,
    layout: Box<dyn LayoutSource>,
    inserter: TranslationInserter,
    last_viewport: Option<Viewport>,
    active_batches: usize,
    epoch: u64,
    stats: BatchStats,
}

impl SessionState {
    /// 插入一条译文，成功时返回 `true`
    fn apply_translation(&mut self, node: &Handle, translated: &str) -> bool {
        if translated.is_empty() || !is_connected(node) {
            return false;
        }

        match self.inserter.insert(node, translated, &mut self.processed) {
            Some(_) => {
                self.stats.units_translated += 1;
                true
            }
            None => false,
        }
    }
}

struct SessionInner {
    state: RefCell<SessionState>,
    gateway: Rc<dyn TranslationGateway>,
    mutations: Debouncer<MutationRecord>,
}

/// 页面翻译会话句柄，克隆后共享同一状态
#[derive(Clone)]
pub struct PageSession {
    inner: Rc<SessionInner>,
}

impl PageSession {
    /// 创建会话
    ///
    /// `document` 是文档根节点，`settings` 的值覆盖配置中的同名项。
    pub fn new(
        document: Handle,
        config: &TranslatorConfig,
        settings: Settings,
        gateway: Rc<dyn TranslationGateway>,
        layout: Box<dyn LayoutSource>,
    ) -> Self {
        let state = SessionState {
            document,
            source_lang: config.source_lang.clone(),
            target_lang: config.target_lang.clone(),
            limits: BatchLimits {
                batch_size: config.pipeline.batch_size,
                max_parallel: config.pipeline.max_parallel_batches,
            },
            drain_delay: Duration::from_millis(config.pipeline.drain_delay_ms),
            rescan_delay: Duration::from_millis(config.observer.rescan_delay_ms),
            filter: TextFilter::new(settings.min_text_length),
            settings,
            cache: TranslationCache::new(),
            queue: PendingQueue::new(),
            processed: NodeSet::new(),
            visibility: VisibilityObserver::new(&config.observer),
            layout,
            inserter: TranslationInserter::default(),
            last_viewport: None,
            active_batches: 0,
            epoch: 0,
            stats: BatchStats::default(),
        };

        let debounce = Duration::from_millis(config.observer.debounce_ms);
        let inner = Rc::new_cyclic(|weak: &Weak<SessionInner>| {
            let weak = weak.clone();
            let mutations = Debouncer::new(debounce, move |records| {
                if let Some(inner) = weak.upgrade() {
                    PageSession { inner }.flush_mutations(records);
                }
            });

            SessionInner {
                state: RefCell::new(state),
                gateway,
                mutations,
            }
        });

        Self { inner }
    }

    /// 替换译文样式来源
    pub fn set_style_source(&self, style_source: Box<dyn StyleSource>) {
        self.inner.state.borrow_mut().inserter = TranslationInserter::new(style_source);
    }

    pub fn document(&self) -> Handle {
        self.inner.state.borrow().document.clone()
    }

    pub fn settings(&self) -> Settings {
        self.inner.state.borrow().settings.clone()
    }

    /// 开始观察页面，禁用时什么也不做
    pub fn start(&self) {
        if !self.inner.state.borrow().settings.enabled {
            info!("翻译已被用户禁用");
            return;
        }

        let registered = self.register_observables();
        info!("翻译会话已启动，观察 {} 个元素", registered);
    }

    fn register_observables(&self) -> usize {
        let mut st = self.inner.state.borrow_mut();
        let candidates = descendant_elements(&st.document);

        let mut registered = 0;
        for element in &candidates {
            if should_observe(element, &st.visibility) {
                st.visibility.observe(element);
                registered += 1;
            }
        }
        registered
    }

    /// 视口变化
    pub fn on_viewport_change(&self, viewport: Viewport) {
        let visible = {
            let mut st = self.inner.state.borrow_mut();
            st.last_viewport = Some(viewport);
            if !st.settings.enabled {
                return;
            }

            let state = &mut *st;
            state.layout.refresh(&state.document);
            state
                .visibility
                .take_intersecting(&viewport, state.layout.as_ref())
        };

        for element in &visible {
            self.scan_element(element);
        }
    }

    /// 用最近一次的视口重新检查可见性
    fn check_visibility(&self) {
        let viewport = self.inner.state.borrow().last_viewport;
        if let Some(viewport) = viewport {
            self.on_viewport_change(viewport);
        }
    }

    fn scan_element(&self, element: &Handle) {
        let (found, enqueued, delay, epoch) = {
            let mut st = self.inner.state.borrow_mut();
            mark_scanned(element);

            let units = ParagraphExtractor::new(&st.filter, &st.processed).extract(element);
            let mut enqueued = 0;
            for unit in &units {
                if !st.processed.contains(unit) && st.queue.enqueue(unit) {
                    enqueued += 1;
                }
            }
            (units.len(), enqueued, st.rescan_delay, st.epoch)
        };

        if found > 0 {
            debug!("扫描发现 {} 个段落，新加入队列 {} 个", found, enqueued);
            self.drain();
        }

        self.schedule_rescan(element.clone(), delay, epoch);
    }

    /// 一段时间后重新观察尚未完成的元素，处理延迟加载的内容
    fn schedule_rescan(&self, element: Handle, delay: Duration, epoch: u64) {
        let weak = Rc::downgrade(&self.inner);
        tokio::task::spawn_local(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                PageSession { inner }.rescan(&element, epoch);
            }
        });
    }

    fn rescan(&self, element: &Handle, epoch: u64) {
        {
            let mut st = self.inner.state.borrow_mut();
            if st.epoch != epoch || !st.settings.enabled {
                return;
            }
            if !is_connected(element) || is_completed(element) {
                return;
            }
            st.visibility.observe(element);
        }
        self.check_visibility();
    }

    /// 尝试派发一个批次
    ///
    /// 进行中的批次已达上限或队列中没有等待的元素时什么也不做。
    pub fn drain(&self) {
        let (batch, epoch) = {
            let mut st = self.inner.state.borrow_mut();
            if st.queue.is_empty() || !st.limits.can_dispatch(st.active_batches) {
                return;
            }

            let batch_size = st.limits.batch_size;
            let batch = st.queue.claim(batch_size);
            if batch.is_empty() {
                return;
            }

            st.active_batches += 1;
            let active = st.active_batches;
            st.stats.record_dispatch(active);
            (batch, st.epoch)
        };

        let session = self.clone();
        tokio::task::spawn_local(async move {
            let result = session.process_batch(&batch, epoch).await;
            session.finish_batch(&batch, epoch, result);
        });
    }

    async fn process_batch(&self, batch: &[Handle], epoch: u64) -> TranslationResult<()> {
        let (plan, source, target) = {
            let mut st = self.inner.state.borrow_mut();
            if st.epoch != epoch {
                return Ok(());
            }

            let state = &mut *st;
            let plan = BatchPlan::prepare(batch, &mut state.cache, &state.processed);
            for (node, translated) in &plan.cached {
                if state.apply_translation(node, translated) {
                    state.stats.cache_hits += 1;
                }
            }
            if plan.needs_remote() {
                state.stats.remote_requests += 1;
            }
            (plan, state.source_lang.clone(), state.target_lang.clone())
        };

        if !plan.needs_remote() {
            return Ok(());
        }

        let translations = self
            .inner
            .gateway
            .translate(&plan.texts, &source, &target)
            .await?;

        let mut st = self.inner.state.borrow_mut();
        let state = &mut *st;
        for ((node, text), translated) in plan.nodes.iter().zip(&plan.texts).zip(&translations) {
            if translated.is_empty() {
                continue;
            }
            state.cache.insert(text, translated);
            if state.epoch != epoch {
                continue;
            }
            state.apply_translation(node, translated);
        }

        Ok(())
    }

    fn finish_batch(&self, batch: &[Handle], epoch: u64, result: TranslationResult<()>) {
        let delay = {
            let mut st = self.inner.state.borrow_mut();
            let current = st.epoch == epoch;

            match result {
                Ok(()) => {
                    st.stats.succeeded += 1;
                    if current {
                        st.queue.complete(batch);
                    }
                }
                Err(e) => {
                    let e = e.with_context(format!("批次 {} 个段落", batch.len()));
                    helpers::log_error(&e);
                    debug!(
                        category = ?e.category(),
                        retryable = e.is_retryable(),
                        "批次失败，段落回到等待状态"
                    );
                    st.stats.record_failure(&e);
                    if current {
                        st.queue.release(batch);
                    }
                }
            }

            st.active_batches = st.active_batches.saturating_sub(1);
            st.drain_delay
        };

        self.schedule_drain(delay);
    }

    fn schedule_drain(&self, delay: Duration) {
        let session = self.clone();
        tokio::task::spawn_local(async move {
            tokio::time::sleep(delay).await;
            session.drain();
        });
    }

    /// 记录一次 DOM 变化，防抖后统一处理
    pub fn notify_mutation(&self, record: MutationRecord) {
        self.inner.mutations.push(record);
    }

    fn flush_mutations(&self, records: Vec<MutationRecord>) {
        let found = {
            let mut st = self.inner.state.borrow_mut();
            let found = collect_observable(&records, &st.visibility);
            for element in &found {
                st.visibility.observe(element);
            }
            found.len()
        };

        if found > 0 {
            info!("检测到 {} 个新元素需要观察", found);
            self.check_visibility();
        }
    }

    /// 应用设置更新
    ///
    /// 最小长度立即生效；重新启用时重新注册并检查可见性；禁用后忽略视口变化。
    pub fn update_settings(&self, patch: &SettingsPatch) {
        let restart = {
            let mut st = self.inner.state.borrow_mut();
            st.settings.apply(patch);
            if let Some(min_text_length) = patch.min_text_length {
                st.filter.set_min_text_length(min_text_length);
            }
            patch.enabled == Some(true)
        };

        if restart {
            self.register_observables();
            self.check_visibility();
        }
    }

    /// 移除全部译文和标记，重新开始翻译
    ///
    /// 缓存保留；进行中的批次照常结束，但不会再修改页面。
    pub fn reset_page(&self) {
        {
            let mut st = self.inner.state.borrow_mut();
            st.epoch += 1;

            let (wrappers, others): (Vec<Handle>, Vec<Handle>) = descendant_elements(&st.document)
                .into_iter()
                .partition(|el| has_class(el, constants::TRANSLATION_WRAPPER_CLASS));

            for wrapper in &wrappers {
                detach(wrapper);
            }
            for element in &others {
                clear_marks(element);
            }

            st.processed.clear();
            st.queue.clear();
            st.visibility.clear();

            info!("重新翻译页面，移除 {} 个译文", wrappers.len());
        }

        self.register_observables();
        self.check_visibility();
    }

    /// 队列为空、没有进行中的批次且没有待处理的变化
    pub fn is_idle(&self) -> bool {
        let st = self.inner.state.borrow();
        st.queue.is_empty() && st.active_batches == 0 && self.inner.mutations.pending() == 0
    }

    /// 等待会话空闲，超时返回 `false`
    pub async fn wait_idle(&self, limit: Duration) -> bool {
        let poll = self
            .inner
            .state
            .borrow()
            .drain_delay
            .max(Duration::from_millis(1));

        tokio::time::timeout(limit, async {
            while !self.is_idle() {
                tokio::time::sleep(poll).await;
            }
        })
        .await
        .is_ok()
    }

    pub fn stats(&self) -> SessionStats {
        let st = self.inner.state.borrow();
        SessionStats {
            batches: st.stats,
            cache: st.cache.stats(),
            cached_entries: st.cache.len(),
            pending: st.queue.pending_count(),
            processing: st.queue.processing_count(),
            active_batches: st.active_batches,
            observed: st.visibility.observed_count(),
            processed: st.processed.len(),
            epoch: st.epoch,
        }
    }
}
