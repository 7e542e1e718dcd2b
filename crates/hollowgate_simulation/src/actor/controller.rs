//! Actor state controller
//!
//! Владеет фиксированным набором состояний и текущим состоянием актора.
//! Протокол переходов:
//! - запрос перезаписывает предыдущий (без очереди, last write wins);
//! - запросы обслуживаются раз в logic tick, но не пока ждём
//!   exit-анимацию предыдущего перехода;
//! - запрос сделанный изнутри state_enter обслуживается на СЛЕДУЮЩЕМ
//!   tick'е — намеренно оставляем один tick чтобы input обновился,
//!   не "чинить" в немедленную рекурсию.

use std::any::Any;
use std::collections::HashMap;

use bevy::prelude::*;

use super::state::{ActorState, StateContext, StateId};

#[derive(Debug, Clone, Copy)]
struct ExitDelay {
    remaining: f32,
    from: StateId,
    into: StateId,
}

/// Сборка машины: reserve даёт StateId до конструирования состояний,
/// чтобы состояния могли ссылаться друг на друга без runtime-поиска.
#[derive(Default)]
pub struct StateMachineBuilder {
    slots: Vec<Option<Box<dyn ActorState>>>,
}

impl StateMachineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reserve(&mut self) -> StateId {
        self.slots.push(None);
        StateId(self.slots.len() - 1)
    }

    pub fn insert(&mut self, id: StateId, state: impl ActorState) -> &mut Self {
        assert!(id.0 < self.slots.len(), "StateId {:?} was not reserved", id);
        assert!(self.slots[id.0].is_none(), "StateId {:?} inserted twice", id);
        self.slots[id.0] = Some(Box::new(state));
        self
    }

    /// Reserve + insert для состояний на которые никто не ссылается заранее
    pub fn add(&mut self, state: impl ActorState) -> StateId {
        let id = self.reserve();
        self.insert(id, state);
        id
    }

    pub fn build(self, initial: StateId) -> ActorStateMachine {
        let states: Vec<Box<dyn ActorState>> = self
            .slots
            .into_iter()
            .enumerate()
            .map(|(i, slot)| slot.unwrap_or_else(|| panic!("Reserved StateId({}) was never inserted", i)))
            .collect();
        assert!(initial.0 < states.len(), "Initial state {:?} out of range", initial);

        // Tag map в порядке регистрации: первый с тегом выигрывает lookup
        let mut tags: HashMap<&'static str, Vec<StateId>> = HashMap::new();
        for (i, state) in states.iter().enumerate() {
            for tag in &state.common().spec().tags {
                tags.entry(tag).or_default().push(StateId(i));
            }
        }

        ActorStateMachine {
            states,
            tags,
            initial,
            current: None,
            requested: None,
            exit_delay: None,
            started: false,
        }
    }
}

/// Машина состояний одного актора. Ровно ноль или одно состояние
/// является текущим в любой момент.
#[derive(Component)]
pub struct ActorStateMachine {
    states: Vec<Box<dyn ActorState>>,
    tags: HashMap<&'static str, Vec<StateId>>,
    initial: StateId,
    current: Option<StateId>,
    requested: Option<StateId>,
    exit_delay: Option<ExitDelay>,
    started: bool,
}

impl ActorStateMachine {
    pub fn builder() -> StateMachineBuilder {
        StateMachineBuilder::new()
    }

    pub fn current(&self) -> Option<StateId> {
        self.current
    }

    pub fn current_name(&self) -> Option<&'static str> {
        self.current.map(|id| self.states[id.0].name())
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Переход ждёт exit-анимацию предыдущего состояния
    pub fn in_exit_delay(&self) -> bool {
        self.exit_delay.is_some()
    }

    /// Запрос перехода; перезаписывает необслуженный запрос
    pub fn set_state(&mut self, state: StateId) {
        assert!(state.0 < self.states.len(), "StateId {:?} out of range", state);
        self.requested = Some(state);
    }

    /// Немедленное обслуживание (reset / загрузка save)
    pub fn set_state_immediate(&mut self, ctx: &mut StateContext, state: StateId) {
        self.set_state(state);
        self.change_state(ctx, state);
    }

    /// Первый по порядку регистрации state с тегом; отсутствие тега —
    /// ошибка конфигурации (fail fast)
    pub fn find_with_tag(&self, tag: &str) -> StateId {
        self.try_find_with_tag(tag)
            .unwrap_or_else(|| panic!("State with tag '{}' not found on actor", tag))
    }

    /// Вариант для runtime-коллабораторов (knockback, death): актор без
    /// такого состояния — не ошибка, вызывающий логирует и пропускает
    pub fn try_find_with_tag(&self, tag: &str) -> Option<StateId> {
        self.tags.get(tag).map(|ids| ids[0])
    }

    /// Downcast состояния для конфигурации извне (например impulse
    /// для knockback найденного по тегу)
    pub fn state_as_mut<T: ActorState>(&mut self, id: StateId) -> Option<&mut T> {
        let state: &mut dyn ActorState = self.states[id.0].as_mut();
        (state as &mut dyn Any).downcast_mut::<T>()
    }

    /// Logic tick. Порядок:
    /// 1. exit-delay активен → тикаем его, по истечении входим в
    ///    отложенное состояние; больше ничего в этом tick'е;
    /// 2. есть запрос → обслуживаем;
    /// 3. иначе state_update текущего.
    pub fn update(&mut self, ctx: &mut StateContext) {
        if !self.started {
            self.started = true;
            if self.requested.is_none() {
                self.requested = Some(self.initial);
            }
        }

        if let Some(mut delay) = self.exit_delay {
            delay.remaining -= ctx.delta;
            self.exit_delay = Some(delay);
            if delay.remaining <= 0.0 {
                self.enter_state(ctx, Some(delay.from), delay.into);
            }
            return;
        }

        if let Some(target) = self.requested {
            self.change_state(ctx, target);
        } else if let Some(current) = self.current {
            self.states[current.0].state_update(ctx);
            self.merge_request(ctx);
        }
    }

    /// Physics tick. Текущее состояние получает fixed_update и во время
    /// exit-delay (состояние уже получило state_exit, но остаётся текущим
    /// до активации следующего).
    pub fn fixed_update(&mut self, ctx: &mut StateContext) {
        if let Some(current) = self.current {
            self.states[current.0].state_fixed_update(ctx);
            self.merge_request(ctx);
        }
    }

    // ------------------------------------------------------------------

    fn merge_request(&mut self, ctx: &mut StateContext) {
        if let Some(request) = ctx.take_request() {
            self.set_state(request);
        }
    }

    fn change_state(&mut self, ctx: &mut StateContext, target: StateId) {
        let from = self.current;

        if let Some(current) = from {
            // Continuations принадлежащие уходящему состоянию отменяются
            // до хука, чтобы exit мог запланировать свои
            ctx.deferred.cancel_for_state(current);

            self.states[current.0].state_exit(ctx, target);
            self.merge_request(ctx);

            let skip = self.states[target.0].common().spec().skip_previous_exit_animation;
            let outgoing = self.states[current.0].common().spec();
            if !skip && outgoing.has_exit_animation() {
                let wait = outgoing.exit_wait();
                crate::log(&format!(
                    "Actor {:?}: {} exited, waiting {:.2}s before {}",
                    ctx.actor,
                    self.states[current.0].name(),
                    wait,
                    self.states[target.0].name(),
                ));
                self.exit_delay = Some(ExitDelay {
                    remaining: wait,
                    from: current,
                    into: target,
                });
                return;
            }
        }

        self.enter_state(ctx, from, target);
    }

    fn enter_state(&mut self, ctx: &mut StateContext, from: Option<StateId>, to: StateId) {
        self.exit_delay = None;
        self.current = Some(to);
        self.states[to.0].state_enter(ctx, from);
        self.merge_request(ctx);

        // Запрос мог смениться внутри state_enter; чистим только если
        // висит именно обслуженный (повторный запрос самого себя из
        // своего же enter тоже гасится — как в исходном протоколе)
        if self.requested == Some(to) {
            self.requested = None;
        }

        crate::log(&format!(
            "Actor {:?}: {} → {}",
            ctx.actor,
            from.map(|f| self.states[f.0].name()).unwrap_or("<none>"),
            self.states[to.0].name(),
        ));
    }
}
