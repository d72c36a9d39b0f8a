pub mod bankrec_testkit;
