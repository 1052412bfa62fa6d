//! Built-in scenarios for the QA Trainer site
//!
//! The site database is expected to hold exactly one user, the seeded
//! account from [`AccountConfig`], at the start of every scenario. Nothing
//! here enforces that; resetting the database between runs is up to the
//! environment.

use crate::config::AccountConfig;
use crate::locator::Locator;
use crate::spec::{Action, Assertion, Measure, RegistrationData, Scenario, Suite};

pub const INDEX_PATH: &str = "/";
pub const DASHBOARD_PATH: &str = "/dashboard.php";
pub const LOGOUT_PATH: &str = "/index.php";

pub const FOOTER_RIGHTS: &str = "© 2023 QA Тренажер. Все права защищены.";
pub const FOOTER_EMAIL: &str = "info@qa-train.ru";
pub const EMAIL_TAKEN: &str = "Email уже используется";
pub const AUTH_BUTTON: &str = "Авторизация";
pub const REGISTER_BUTTON: &str = "Регистрация";
pub const USERS_HEADING: &str = "Зарегистрировано пользователей";
pub const HOME_TAB: &str = "Главная";
pub const LOGOUT_LINK: &str = "Выход";

/// Gap between the header and the forms section, the same 2rem used
/// between the footer and the comments section
pub const HEADER_GAP_PX: f64 = 32.0;

const FOOTER_RIGHTS_XPATH: &str = "/html/body/footer/div/p[1]";
const FOOTER_TEL_XPATH: &str = "/html/body/footer/div/p[2]/a";
const FOOTER_EMAIL_XPATH: &str = "/html/body/footer/div/p[3]";
const AUTH_BUTTON_XPATH: &str = "/html/body/main/section[1]/div[1]/form/button";
const REGISTER_BUTTON_XPATH: &str = "/html/body/main/section[1]/div[2]/form/button";

fn press_tab(selector: Locator) -> Action {
    Action::Press {
        selector,
        key: "Tab".to_string(),
    }
}

fn text_equals(selector: Locator, expected: &str) -> Assertion {
    Assertion::TextEquals {
        selector,
        expected: expected.to_string(),
    }
}

fn visible(selector: Locator) -> Assertion {
    Assertion::Visible { selector }
}

/// Fills and submits the registration form the way a user tabs through it
pub fn register(data: &RegistrationData) -> Vec<Action> {
    let login = Locator::role("textbox", "Логин:");
    let email = Locator::css("#regEmail");
    let password = Locator::css("#regPassword");
    let confirm = Locator::role("textbox", "Подтверждение пароля:");
    let avatar = Locator::role("button", "Аватар:");
    let consent = Locator::role("checkbox", "Согласен с политикой конфиденциальности");

    vec![
        Action::Navigate {
            url: INDEX_PATH.to_string(),
        },
        Action::Click {
            selector: login.clone(),
        },
        Action::Fill {
            selector: login.clone(),
            value: data.login.clone(),
        },
        press_tab(login),
        Action::Fill {
            selector: email,
            value: data.email.clone(),
        },
        Action::Click {
            selector: password.clone(),
        },
        Action::Fill {
            selector: password.clone(),
            value: data.password.clone(),
        },
        press_tab(password),
        Action::Fill {
            selector: confirm.clone(),
            value: data.password.clone(),
        },
        press_tab(confirm),
        // no avatar upload
        press_tab(avatar),
        Action::Check {
            selector: consent.clone(),
        },
        press_tab(consent),
        Action::Click {
            selector: Locator::role("button", "Register"),
        },
    ]
}

/// Logs in from the landing page and waits for the dashboard
pub fn login(account: &AccountConfig) -> Vec<Action> {
    let email = Locator::css("#loginEmail");
    let password = Locator::css("#loginPassword");

    vec![
        Action::Navigate {
            url: INDEX_PATH.to_string(),
        },
        Action::Click {
            selector: email.clone(),
        },
        Action::Fill {
            selector: email.clone(),
            value: account.email.clone(),
        },
        press_tab(email),
        Action::Fill {
            selector: password.clone(),
            value: account.password.clone(),
        },
        press_tab(password),
        Action::Click {
            selector: Locator::role("button", "Auth"),
        },
        Action::WaitForUrl {
            url: DASHBOARD_PATH.to_string(),
            timeout_ms: None,
        },
    ]
}

fn footer_rights_and_phone() -> Vec<Assertion> {
    let rights = Locator::xpath(FOOTER_RIGHTS_XPATH);
    let tel = Locator::xpath(FOOTER_TEL_XPATH);

    vec![
        visible(rights.clone()),
        text_equals(rights, FOOTER_RIGHTS),
        visible(tel.clone()),
        Assertion::AttributeMatches {
            selector: tel.clone(),
            attribute: "href".to_string(),
            pattern: "tel:".to_string(),
        },
        Assertion::HrefMatchesText {
            selector: tel,
            scheme: "tel:".to_string(),
        },
    ]
}

pub fn registration_suite(account: &AccountConfig) -> Suite {
    let same_email = RegistrationData {
        login: "o12".to_string(),
        ..account.registration()
    };
    let same_login = RegistrationData {
        email: "o12@mail.ru".to_string(),
        ..account.registration()
    };

    let duplicate_email = Scenario::new("wrong registration (different Login, same E-mail)")
        .with_description("the seeded e-mail is reported as taken")
        .actions(register(&same_email))
        .assert(text_equals(Locator::css("#emailCheck"), EMAIL_TAKEN))
        // and the success banner stays empty
        .assert(text_equals(Locator::css("#registerSuccess"), ""));

    let duplicate_login = Scenario::new("wrong registration (same Login, different E-mail)")
        .with_description("registration must not succeed")
        .actions(register(&same_login))
        .assert(text_equals(Locator::css("#registerSuccess"), ""));

    Suite::new("registration")
        .with_description("registration form rejects the seeded account")
        .tag("registration")
        .scenario(duplicate_email)
        .scenario(duplicate_login)
}

pub fn landing_suite() -> Suite {
    let footer = {
        let email = Locator::xpath(FOOTER_EMAIL_XPATH);
        let mut assertions = footer_rights_and_phone();
        assertions.push(visible(email.clone()));
        assertions.push(text_equals(email, FOOTER_EMAIL));
        assertions
            .into_iter()
            .fold(
                Scenario::new("does footer have all 3 info (rights, tel, e-mail)?"),
                Scenario::assert,
            )
    };

    let auth = Locator::xpath(AUTH_BUTTON_XPATH);
    let register = Locator::xpath(REGISTER_BUTTON_XPATH);
    let buttons = Scenario::new("does buttons Reg and Auth writted in rus?")
        .assert(visible(auth.clone()))
        .assert(text_equals(auth, AUTH_BUTTON))
        .assert(visible(register.clone()))
        .assert(text_equals(register, REGISTER_BUTTON));

    let header = Locator::css("header");
    let forms = Locator::css("section.auth-section");
    let gap = Measure::VerticalGap {
        upper: header.clone(),
        lower: forms.clone(),
    };
    let layout = Scenario::new("is there a vertical gap between Header and Forms section?")
        .tag("layout")
        .assert(visible(header))
        .assert(visible(forms))
        .assert(Assertion::NumericGreaterThan {
            measure: gap.clone(),
            threshold: 0.0,
        })
        .assert(Assertion::NumericEquals {
            measure: gap,
            expected: HEADER_GAP_PX,
            tolerance: 0.0,
        });

    Suite::new("landing")
        .with_description("in \"Главная\". Before every test we just go to site")
        .tag("smoke")
        .with_setup(Scenario::new("open landing page").action(Action::Navigate {
            url: INDEX_PATH.to_string(),
        }))
        .scenario(footer)
        .scenario(buttons)
        .scenario(layout)
}

pub fn auth_suite(account: &AccountConfig) -> Suite {
    Suite::new("auth")
        .with_description("seeded account can log in")
        .tag("smoke")
        .scenario(
            Scenario::new("right Auth")
                .actions(login(account))
                .assert(Assertion::UrlContains {
                    expected: DASHBOARD_PATH.to_string(),
                }),
        )
}

pub fn dashboard_suite(account: &AccountConfig) -> Suite {
    let setup = Scenario::new("log in")
        .actions(login(account))
        .assert(Assertion::UrlContains {
            expected: DASHBOARD_PATH.to_string(),
        });

    let footer = footer_rights_and_phone().into_iter().fold(
        Scenario::new("does footer have all 3 info (rights, tel, e-mail)?"),
        Scenario::assert,
    );

    let heading = Scenario::new("does word \"ЗарегИстрировано\" (not \"Е\") writed rigthly?")
        .assert(text_equals(
            Locator::css("section.dashboard-section .stats-container .stat-card h3"),
            USERS_HEADING,
        ));

    let tabs = Locator::css("header nav ul > li");
    let home_tab = Scenario::new("does tab \"Главная\" exist in the header menu?")
        .assert(Assertion::CountEquals {
            selector: tabs,
            expected: 4,
        })
        .assert(Assertion::AttributeEquals {
            selector: Locator::css("header nav ul > li >> nth=0"),
            attribute: "value".to_string(),
            expected: HOME_TAB.to_string(),
        })
        .assert(visible(Locator::css(format!(
            "ul > li[value=\"{}\"] >> nth=0",
            HOME_TAB
        ))));

    let logout_link = Scenario::new("is logout tab \"Выход\" shown in the header menu?")
        .assert(visible(Locator::role("link", LOGOUT_LINK)));

    let logout = Scenario::new("does logout tab \"Выход\" loads main page?")
        .action(Action::Click {
            selector: Locator::role("link", LOGOUT_LINK),
        })
        .action(Action::WaitForUrl {
            url: LOGOUT_PATH.to_string(),
            timeout_ms: None,
        })
        .assert(Assertion::UrlContains {
            expected: LOGOUT_PATH.to_string(),
        });

    Suite::new("dashboard")
        .with_description("in \"Личный кабинет\". Before every test we do auth")
        .tag("authenticated")
        .with_setup(setup)
        .scenario(footer)
        .scenario(heading)
        .scenario(home_tab)
        .scenario(logout_link)
        .scenario(logout)
}

/// Every built-in suite, in run order
pub fn all(account: &AccountConfig) -> Vec<Suite> {
    vec![
        registration_suite(account),
        landing_suite(),
        auth_suite(account),
        dashboard_suite(account),
    ]
}
