use std::time::Duration;

use totp_keeper::{unix_time, SecretStore, TotpEngine};

// Stand-in for the real presentation layer: load the store, then re-render
// every account's code and countdown once per second.
fn main() {
    let store = SecretStore::load("totp_accounts.json");
    let engine = TotpEngine::default();

    if store.list().is_empty() {
        eprintln!("no accounts in totp_accounts.json");
        return;
    }

    loop {
        let at = unix_time().expect("system clock before unix epoch");
        for name in store.list() {
            let Some(secret) = store.get(&name) else {
                continue;
            };
            match engine.compute(&secret, at) {
                Ok(totp) => println!("{}\t{}\t{}s left", name, totp.code, totp.seconds_remaining),
                // a bad secret shows as an error marker, the tick goes on
                Err(e) => println!("{}\tERROR\t{}", name, e),
            }
        }
        println!();
        std::thread::sleep(Duration::from_secs(1));
    }
}
