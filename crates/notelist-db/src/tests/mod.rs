mod migration_tests;
