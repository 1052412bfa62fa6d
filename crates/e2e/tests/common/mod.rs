//! In-memory page used to drive the runner without a browser

#![allow(dead_code)]

use async_trait::async_trait;
use qa_trainer_e2e::{BoundingBox, Browser, E2eError, E2eResult, Locator, Page};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct FakeElement {
    pub text: String,
    pub attrs: HashMap<String, String>,
    pub visible: bool,
    pub bbox: Option<BoundingBox>,
}

impl FakeElement {
    pub fn text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            visible: true,
            ..Default::default()
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn at(mut self, y: f64, height: f64) -> Self {
        self.bbox = Some(BoundingBox {
            x: 0.0,
            y,
            width: 1280.0,
            height,
        });
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

/// Reacts to a click: sees every filled value, may rewrite elements and URL
pub type ClickHandler = Arc<dyn Fn(&mut FakeState) + Send + Sync>;

#[derive(Default)]
pub struct FakeState {
    pub url: String,
    pub elements: HashMap<String, FakeElement>,
    /// Overrides for `count`, keyed by locator notation
    pub counts: HashMap<String, usize>,
    pub filled: HashMap<String, String>,
    pub checked: Vec<String>,
}

/// A page whose DOM is a map from locator notation to element
#[derive(Clone, Default)]
pub struct FakePage {
    pub state: Arc<Mutex<FakeState>>,
    pub journal: Arc<Mutex<Vec<String>>>,
    pub on_click: HashMap<String, ClickHandler>,
    pub screenshots: Arc<Mutex<Vec<String>>>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, locator: &str, element: FakeElement) -> Self {
        self.state
            .lock()
            .unwrap()
            .elements
            .insert(locator.to_string(), element);
        self
    }

    pub fn with_count(self, locator: &str, count: usize) -> Self {
        self.state
            .lock()
            .unwrap()
            .counts
            .insert(locator.to_string(), count);
        self
    }

    pub fn on_click(mut self, locator: &str, handler: ClickHandler) -> Self {
        self.on_click.insert(locator.to_string(), handler);
        self
    }

    pub fn journal(&self) -> Vec<String> {
        self.journal.lock().unwrap().clone()
    }

    fn log(&self, entry: String) {
        self.journal.lock().unwrap().push(entry);
    }

    fn element(&self, locator: &Locator) -> E2eResult<FakeElement> {
        self.state
            .lock()
            .unwrap()
            .elements
            .get(&locator.to_string())
            .cloned()
            .ok_or_else(|| E2eError::Locator {
                locator: locator.to_string(),
                message: "no element matches".to_string(),
            })
    }
}

#[async_trait]
impl Page for FakePage {
    async fn goto(&mut self, url: &str) -> E2eResult<()> {
        self.log(format!("goto {}", url));
        self.state.lock().unwrap().url = url.to_string();
        Ok(())
    }

    async fn fill(&mut self, locator: &Locator, value: &str) -> E2eResult<()> {
        self.log(format!("fill {}={}", locator, value));
        self.element(locator)?;
        self.state
            .lock()
            .unwrap()
            .filled
            .insert(locator.to_string(), value.to_string());
        Ok(())
    }

    async fn click(&mut self, locator: &Locator) -> E2eResult<()> {
        self.log(format!("click {}", locator));
        self.element(locator)?;
        if let Some(handler) = self.on_click.get(&locator.to_string()) {
            let mut state = self.state.lock().unwrap();
            (handler.as_ref())(&mut *state);
        }
        Ok(())
    }

    async fn press(&mut self, locator: &Locator, key: &str) -> E2eResult<()> {
        self.log(format!("press {}:{}", locator, key));
        self.element(locator)?;
        Ok(())
    }

    async fn check(&mut self, locator: &Locator) -> E2eResult<()> {
        self.log(format!("check {}", locator));
        self.element(locator)?;
        self.state.lock().unwrap().checked.push(locator.to_string());
        Ok(())
    }

    async fn wait_for_url(&mut self, pattern: &str, timeout: Duration) -> E2eResult<()> {
        self.log(format!("wait_for_url {}", pattern));
        if self.state.lock().unwrap().url == pattern {
            Ok(())
        } else {
            Err(E2eError::Timeout(format!(
                "waitForURL {} ({} ms)",
                pattern,
                timeout.as_millis()
            )))
        }
    }

    async fn url(&mut self) -> E2eResult<String> {
        self.log("url".to_string());
        Ok(self.state.lock().unwrap().url.clone())
    }

    async fn inner_text(&mut self, locator: &Locator) -> E2eResult<String> {
        self.log(format!("inner_text {}", locator));
        Ok(self.element(locator)?.text)
    }

    async fn attribute(&mut self, locator: &Locator, name: &str) -> E2eResult<Option<String>> {
        self.log(format!("attribute {}@{}", locator, name));
        Ok(self.element(locator)?.attrs.get(name).cloned())
    }

    async fn is_visible(&mut self, locator: &Locator, _timeout: Duration) -> E2eResult<bool> {
        self.log(format!("is_visible {}", locator));
        Ok(self
            .state
            .lock()
            .unwrap()
            .elements
            .get(&locator.to_string())
            .map(|e| e.visible)
            .unwrap_or(false))
    }

    async fn count(&mut self, locator: &Locator) -> E2eResult<usize> {
        self.log(format!("count {}", locator));
        let state = self.state.lock().unwrap();
        let key = locator.to_string();
        Ok(state
            .counts
            .get(&key)
            .copied()
            .unwrap_or_else(|| usize::from(state.elements.contains_key(&key))))
    }

    async fn bounding_box(&mut self, locator: &Locator) -> E2eResult<Option<BoundingBox>> {
        self.log(format!("bounding_box {}", locator));
        Ok(self
            .state
            .lock()
            .unwrap()
            .elements
            .get(&locator.to_string())
            .and_then(|e| e.bbox))
    }

    async fn screenshot(&mut self, path: &Path) -> E2eResult<()> {
        self.log(format!("screenshot {}", path.display()));
        std::fs::write(path, b"\x89PNG fake")?;
        self.screenshots
            .lock()
            .unwrap()
            .push(path.display().to_string());
        Ok(())
    }

    async fn close(&mut self) -> E2eResult<()> {
        self.log("close".to_string());
        Ok(())
    }
}

/// Hands out a fresh copy of a template page per scenario
pub struct FakeBrowser {
    factory: Arc<dyn Fn() -> FakePage + Send + Sync>,
    pub opened: AtomicUsize,
    pub pages: Mutex<Vec<FakePage>>,
}

impl FakeBrowser {
    pub fn new(factory: impl Fn() -> FakePage + Send + Sync + 'static) -> Self {
        Self {
            factory: Arc::new(factory),
            opened: AtomicUsize::new(0),
            pages: Mutex::new(Vec::new()),
        }
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Browser for FakeBrowser {
    async fn new_page(&self) -> E2eResult<Box<dyn Page>> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        let page = (self.factory)();
        self.pages.lock().unwrap().push(page.clone());
        Ok(Box::new(page))
    }
}

/// The QA Trainer site as the built-in catalogue sees it, with the seeded
/// account `o12o12 / o12o12@mail.ru / o12o12` already registered
pub fn qa_trainer_site() -> FakePage {
    const BASE: &str = "https://pre.pasdel.ru/";

    let register: ClickHandler = Arc::new(|state: &mut FakeState| {
        let login = state
            .filled
            .get("role=textbox[name=\"Логин:\"]")
            .cloned()
            .unwrap_or_default();
        let email = state.filled.get("#regEmail").cloned().unwrap_or_default();
        let (email_check, success) = if email == "o12o12@mail.ru" {
            ("Email уже используется", "")
        } else if login == "o12o12" {
            ("", "")
        } else {
            ("", "Регистрация успешна! Теперь вы можете войти")
        };
        state
            .elements
            .insert("#emailCheck".to_string(), FakeElement::text(email_check));
        state
            .elements
            .insert("#registerSuccess".to_string(), FakeElement::text(success));
    });

    let auth: ClickHandler = Arc::new(|state: &mut FakeState| {
        let email = state.filled.get("#loginEmail").cloned().unwrap_or_default();
        let password = state
            .filled
            .get("#loginPassword")
            .cloned()
            .unwrap_or_default();
        if email == "o12o12@mail.ru" && password == "o12o12" {
            state.url = format!("{}dashboard.php", BASE);
        }
    });

    let logout: ClickHandler = Arc::new(|state: &mut FakeState| {
        state.url = format!("{}index.php", BASE);
    });

    FakePage::new()
        // registration form
        .with("role=textbox[name=\"Логин:\"]", FakeElement::text(""))
        .with("#regEmail", FakeElement::text(""))
        .with("#regPassword", FakeElement::text(""))
        .with("role=textbox[name=\"Подтверждение пароля:\"]", FakeElement::text(""))
        .with("role=button[name=\"Аватар:\"]", FakeElement::text(""))
        .with(
            "role=checkbox[name=\"Согласен с политикой конфиденциальности\"]",
            FakeElement::text(""),
        )
        .with("role=button[name=\"Register\"]", FakeElement::text("Register"))
        .with("#emailCheck", FakeElement::text(""))
        .with("#registerSuccess", FakeElement::text(""))
        // login form
        .with("#loginEmail", FakeElement::text(""))
        .with("#loginPassword", FakeElement::text(""))
        .with("role=button[name=\"Auth\"]", FakeElement::text("Auth"))
        // layout
        .with("header", FakeElement::text("").at(0.0, 80.0))
        .with("section.auth-section", FakeElement::text("").at(112.0, 400.0))
        .with(
            "xpath=/html/body/main/section[1]/div[1]/form/button",
            FakeElement::text("Авторизация"),
        )
        .with(
            "xpath=/html/body/main/section[1]/div[2]/form/button",
            FakeElement::text("Регистрация"),
        )
        // footer
        .with(
            "xpath=/html/body/footer/div/p[1]",
            FakeElement::text("© 2023 QA Тренажер. Все права защищены."),
        )
        .with(
            "xpath=/html/body/footer/div/p[2]/a",
            FakeElement::text("+7 (999) 123-45-67").attr("href", "tel:+79991234567"),
        )
        .with("xpath=/html/body/footer/div/p[3]", FakeElement::text("info@qa-train.ru"))
        // dashboard
        .with(
            "section.dashboard-section .stats-container .stat-card h3",
            FakeElement::text("Зарегистрировано пользователей"),
        )
        .with_count("header nav ul > li", 4)
        .with(
            "header nav ul > li >> nth=0",
            FakeElement::text("Главная").attr("value", "Главная"),
        )
        .with("ul > li[value=\"Главная\"] >> nth=0", FakeElement::text("Главная"))
        .with("role=link[name=\"Выход\"]", FakeElement::text("Выход"))
        .on_click("role=button[name=\"Register\"]", register)
        .on_click("role=button[name=\"Auth\"]", auth)
        .on_click("role=link[name=\"Выход\"]", logout)
}
